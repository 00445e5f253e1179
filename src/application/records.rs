//! Read-through / write-through record operations.
//!
//! Reads consult the cache first and fall back to the document store, populating
//! the cache on the way out. Writes go to the store first; cache invalidation and
//! repopulation afterwards are best-effort and never fail the operation.

use std::collections::BTreeMap;
use std::sync::Arc;

use metrics::counter;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::application::repos::{CacheError, CacheStore, DocumentStore, RepoError};
use crate::cache::{
    CacheConfig, CacheKey, METRIC_CACHE_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_MISS,
    RECORD_PATTERN,
};
use crate::domain::error::DomainError;
use crate::domain::records::{Record, RecordId, StoredRecord};

const SOURCE: &str = "recache::records";

#[derive(Debug, Error)]
pub enum RecordServiceError {
    #[error("record not found")]
    NotFound,
    #[error("malformed body: {0}")]
    MalformedBody(String),
    #[error(transparent)]
    Store(#[from] RepoError),
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl From<DomainError> for RecordServiceError {
    fn from(err: DomainError) -> Self {
        let DomainError::Validation { message } = err;
        Self::MalformedBody(message)
    }
}

/// Ping outcome for each collaborator.
#[derive(Debug)]
pub struct CollaboratorHealth {
    pub document_store: Result<(), RepoError>,
    pub cache_store: Result<(), CacheError>,
}

impl CollaboratorHealth {
    pub fn is_healthy(&self) -> bool {
        self.document_store.is_ok() && self.cache_store.is_ok()
    }
}

#[derive(Clone)]
pub struct RecordService {
    store: Arc<dyn DocumentStore>,
    cache: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl RecordService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        cache: Arc<dyn CacheStore>,
        config: CacheConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub async fn list_all(&self) -> Result<Vec<Value>, RecordServiceError> {
        let key = CacheKey::AllRecords;
        if let Some(documents) = self.read_cached::<Vec<Value>>(&key).await {
            return Ok(documents);
        }

        let documents: Vec<Value> = self
            .store
            .find_all()
            .await?
            .into_iter()
            .map(StoredRecord::into_document)
            .collect();

        self.populate(&key, &documents).await;
        Ok(documents)
    }

    pub async fn get_one(&self, id: &RecordId) -> Result<Value, RecordServiceError> {
        let key = CacheKey::record(id);
        if let Some(document) = self.read_cached::<Value>(&key).await {
            return Ok(document);
        }

        let stored = self
            .store
            .find_one(id)
            .await?
            .ok_or(RecordServiceError::NotFound)?;
        let document = stored.into_document();

        self.populate(&key, &document).await;
        Ok(document)
    }

    pub async fn create(&self, body: Value) -> Result<RecordId, RecordServiceError> {
        let record = Record::from_body(body)?;
        let id = self.store.insert_one(&record).await?;
        debug!(
            target = SOURCE,
            id = %id,
            fields = record.len(),
            "record created"
        );

        self.invalidate(&[CacheKey::AllRecords]).await;
        let document = record.with_id(id.clone()).into_document();
        self.populate(&CacheKey::record(&id), &document).await;
        Ok(id)
    }

    pub async fn bulk_create(&self, body: Value) -> Result<Vec<RecordId>, RecordServiceError> {
        let records = Record::many_from_body(body)?;
        if records.is_empty() {
            return Err(RecordServiceError::MalformedBody(
                "expected at least one record".to_string(),
            ));
        }

        let ids = self.store.insert_many(&records).await?;
        if ids.len() != records.len() {
            return Err(RecordServiceError::Store(RepoError::Persistence(format!(
                "store returned {} identifiers for {} records",
                ids.len(),
                records.len()
            ))));
        }
        debug!(target = SOURCE, count = ids.len(), "records created");

        self.invalidate(&[CacheKey::AllRecords]).await;
        for (id, record) in ids.iter().zip(records) {
            let document = record.with_id(id.clone()).into_document();
            self.populate(&CacheKey::record(id), &document).await;
        }
        Ok(ids)
    }

    pub async fn replace(&self, id: &RecordId, body: Value) -> Result<(), RecordServiceError> {
        let record = Record::from_body(body)?;
        if !self.store.replace_one(id, &record).await? {
            return Err(RecordServiceError::NotFound);
        }

        let key = CacheKey::record(id);
        self.invalidate(&[CacheKey::AllRecords, key.clone()]).await;
        let document = record.with_id(id.clone()).into_document();
        self.populate(&key, &document).await;
        Ok(())
    }

    /// Returns the merged record as stored.
    pub async fn merge(&self, id: &RecordId, body: Value) -> Result<Value, RecordServiceError> {
        let patch = Record::from_body(body)?;
        let merged = self
            .store
            .merge_one(id, &patch)
            .await?
            .ok_or(RecordServiceError::NotFound)?;

        self.invalidate(&[CacheKey::AllRecords]).await;
        let document = merged.into_document();
        self.populate(&CacheKey::record(id), &document).await;
        Ok(document)
    }

    pub async fn delete(&self, id: &RecordId) -> Result<(), RecordServiceError> {
        if !self.store.delete_one(id).await? {
            return Err(RecordServiceError::NotFound);
        }

        self.invalidate(&[CacheKey::record(id), CacheKey::AllRecords])
            .await;
        Ok(())
    }

    pub async fn flush_cache(&self) -> Result<(), RecordServiceError> {
        self.cache.flush_all().await?;
        debug!(target = SOURCE, "cache flushed");
        Ok(())
    }

    /// Decoded contents of every per-record cache entry.
    pub async fn inspect_cache(&self) -> Result<BTreeMap<String, Value>, RecordServiceError> {
        let mut snapshot = BTreeMap::new();
        for key in self.cache.keys(RECORD_PATTERN).await? {
            // Entries can expire between listing and reading.
            let Some(raw) = self.cache.get(&key).await? else {
                continue;
            };
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => {
                    snapshot.insert(key, value);
                }
                Err(err) => {
                    warn!(
                        target = SOURCE,
                        key = %key,
                        error = %err,
                        "skipping undecodable cache entry"
                    );
                }
            }
        }
        Ok(snapshot)
    }

    /// Drop every record entry and the collection snapshot.
    pub async fn purge_record_cache(&self) -> Result<u64, RecordServiceError> {
        let mut removed = self.cache.delete_pattern(RECORD_PATTERN).await?;
        if self.cache.delete(&CacheKey::AllRecords.render()).await? {
            removed += 1;
        }
        debug!(target = SOURCE, removed, "record cache purged");
        Ok(removed)
    }

    pub async fn health(&self) -> CollaboratorHealth {
        let (document_store, cache_store) = tokio::join!(self.store.ping(), self.cache.ping());
        CollaboratorHealth {
            document_store,
            cache_store,
        }
    }

    async fn read_cached<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let rendered = key.render();
        let raw = match self.cache.get(&rendered).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!(METRIC_CACHE_MISS, "scope" => key.scope()).increment(1);
                return None;
            }
            Err(err) => {
                counter!(METRIC_CACHE_ERROR, "op" => "get").increment(1);
                counter!(METRIC_CACHE_MISS, "scope" => key.scope()).increment(1);
                warn!(
                    target = SOURCE,
                    key = %rendered,
                    error = %err,
                    "cache read failed, falling back to document store"
                );
                return None;
            }
        };

        match serde_json::from_str::<T>(&raw) {
            Ok(value) => {
                counter!(METRIC_CACHE_HIT, "scope" => key.scope()).increment(1);
                Some(value)
            }
            Err(err) => {
                counter!(METRIC_CACHE_MISS, "scope" => key.scope()).increment(1);
                warn!(
                    target = SOURCE,
                    key = %rendered,
                    error = %err,
                    "discarding undecodable cache entry"
                );
                self.invalidate(std::slice::from_ref(key)).await;
                None
            }
        }
    }

    async fn populate<T: Serialize + ?Sized>(&self, key: &CacheKey, value: &T) {
        let rendered = key.render();
        let payload = match serde_json::to_string(value) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(target = SOURCE, key = %rendered, error = %err, "cache payload encoding failed");
                return;
            }
        };

        if let Err(err) = self.cache.set_ex(&rendered, payload, self.config.ttl).await {
            counter!(METRIC_CACHE_ERROR, "op" => "set").increment(1);
            warn!(
                target = SOURCE,
                key = %rendered,
                error = %err,
                "cache population failed; entry left absent"
            );
        }
    }

    async fn invalidate(&self, keys: &[CacheKey]) {
        for key in keys {
            let rendered = key.render();
            if let Err(err) = self.cache.delete(&rendered).await {
                counter!(METRIC_CACHE_ERROR, "op" => "delete").increment(1);
                warn!(
                    target = SOURCE,
                    key = %rendered,
                    error = %err,
                    "cache invalidation failed; entry may be stale until it expires"
                );
            }
        }
    }
}
