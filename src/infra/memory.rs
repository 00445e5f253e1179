//! Process-local document store used for development and tests.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::application::repos::{DocumentStore, RepoError};
use crate::domain::records::{Record, RecordId, StoredRecord};

struct Slot {
    position: u64,
    record: Record,
}

#[derive(Default)]
pub struct InMemoryDocumentStore {
    records: DashMap<RecordId, Slot>,
    sequence: AtomicU64,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn insert(&self, record: &Record) -> RecordId {
        let id = RecordId::from(Uuid::new_v4().to_string());
        let position = self.sequence.fetch_add(1, Ordering::SeqCst);
        self.records.insert(
            id.clone(),
            Slot {
                position,
                record: record.clone(),
            },
        );
        id
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_one(&self, id: &RecordId) -> Result<Option<StoredRecord>, RepoError> {
        Ok(self
            .records
            .get(id)
            .map(|slot| slot.record.clone().with_id(id.clone())))
    }

    async fn find_all(&self) -> Result<Vec<StoredRecord>, RepoError> {
        let mut slots: Vec<(u64, StoredRecord)> = self
            .records
            .iter()
            .map(|entry| {
                let slot = entry.value();
                (
                    slot.position,
                    slot.record.clone().with_id(entry.key().clone()),
                )
            })
            .collect();
        slots.sort_by_key(|(position, _)| *position);
        Ok(slots.into_iter().map(|(_, stored)| stored).collect())
    }

    async fn insert_one(&self, record: &Record) -> Result<RecordId, RepoError> {
        Ok(self.insert(record))
    }

    async fn insert_many(&self, records: &[Record]) -> Result<Vec<RecordId>, RepoError> {
        Ok(records.iter().map(|record| self.insert(record)).collect())
    }

    async fn replace_one(&self, id: &RecordId, record: &Record) -> Result<bool, RepoError> {
        match self.records.get_mut(id) {
            Some(mut slot) => {
                slot.record = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn merge_one(
        &self,
        id: &RecordId,
        patch: &Record,
    ) -> Result<Option<StoredRecord>, RepoError> {
        Ok(self.records.get_mut(id).map(|mut slot| {
            slot.record.merge(patch);
            slot.record.clone().with_id(id.clone())
        }))
    }

    async fn delete_one(&self, id: &RecordId) -> Result<bool, RepoError> {
        Ok(self.records.remove(id).is_some())
    }

    async fn ping(&self) -> Result<(), RepoError> {
        Ok(())
    }
}
