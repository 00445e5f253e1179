//! Record cache support.
//!
//! The cache is a best-effort accelerator in front of the document store:
//!
//! - `records:all` holds a snapshot of the full collection
//! - `record:{id}` holds one record, identifier included
//!
//! Every entry is written with the configured TTL. The store behind the cache
//! is pluggable (`MemoryCacheStore` here, `RedisCacheStore` in `infra`).
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! backend = "redis"
//! url = "redis://127.0.0.1:6379/0"
//! ttl_seconds = 300
//! ```

mod config;
mod keys;
mod lock;
mod store;

pub use config::{CacheConfig, MAX_TTL_SECS};
pub use keys::{CacheKey, RECORD_PATTERN, glob_match};
pub use store::MemoryCacheStore;

pub(crate) use lock::mutex_lock;

/// Lookups answered from the cache, labelled by `scope` (`list` or `record`).
pub const METRIC_CACHE_HIT: &str = "recache_cache_hit_total";
/// Lookups that fell through to the document store, labelled by `scope`.
pub const METRIC_CACHE_MISS: &str = "recache_cache_miss_total";
/// Failed cache commands, labelled by `op`.
pub const METRIC_CACHE_ERROR: &str = "recache_cache_error_total";
