//! Collaborator traits describing persistence and cache adapters.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::records::{Record, RecordId, StoredRecord};

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

/// The service of record. Every operation is atomic for a single document and
/// nothing more.
///
/// Identifiers the store cannot have issued match nothing: lookups return
/// `None`, mutations report no match.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn find_one(&self, id: &RecordId) -> Result<Option<StoredRecord>, RepoError>;

    /// All records in insertion order.
    async fn find_all(&self) -> Result<Vec<StoredRecord>, RepoError>;

    async fn insert_one(&self, record: &Record) -> Result<RecordId, RepoError>;

    /// Identifiers are returned in input order.
    async fn insert_many(&self, records: &[Record]) -> Result<Vec<RecordId>, RepoError>;

    /// Replace every field. Returns `false` when no record has this id.
    async fn replace_one(&self, id: &RecordId, record: &Record) -> Result<bool, RepoError>;

    /// Shallow-merge `patch` into the stored fields and return the merged record.
    async fn merge_one(
        &self,
        id: &RecordId,
        patch: &Record,
    ) -> Result<Option<StoredRecord>, RepoError>;

    /// Returns `false` when nothing was removed.
    async fn delete_one(&self, id: &RecordId) -> Result<bool, RepoError>;

    async fn ping(&self) -> Result<(), RepoError>;
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store unreachable: {0}")]
    Unreachable(String),
    #[error("cache command failed: {0}")]
    Command(String),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error() || err.is_connection_refusal() || err.is_timeout() {
            Self::Unreachable(err.to_string())
        } else {
            Self::Command(err.to_string())
        }
    }
}

/// Key/value accelerator with per-entry expiry. Values are opaque strings;
/// patterns use Redis glob syntax (`*`, `?`).
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    /// Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Returns the number of entries removed.
    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError>;

    async fn flush_all(&self) -> Result<(), CacheError>;

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError>;

    async fn ping(&self) -> Result<(), CacheError>;
}
