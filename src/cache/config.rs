//! Cache configuration.

use std::{num::NonZeroUsize, time::Duration};

const DEFAULT_TTL_SECS: u64 = 300;

/// Largest TTL accepted anywhere; Redis rejects expiries above this.
pub const MAX_TTL_SECS: u64 = (i64::MAX / 1000) as u64;
const DEFAULT_MEMORY_MAX_ENTRIES: usize = 10_000;

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Expiry applied to every entry written by the record service.
    pub ttl: Duration,
    /// Capacity of the in-process cache store.
    pub memory_max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            memory_max_entries: DEFAULT_MEMORY_MAX_ENTRIES,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            ttl: settings.ttl,
            memory_max_entries: settings.memory_max_entries.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_max_entries_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_max_entries).unwrap_or(NonZeroUsize::MIN)
    }
}
