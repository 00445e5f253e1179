//! In-process cache store.
//!
//! Mirrors the subset of Redis the record service relies on: string values with
//! a per-entry TTL and glob key patterns. Expired entries are dropped lazily when
//! they are touched; capacity pressure evicts the least recently used entry.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;

use crate::application::repos::{CacheError, CacheStore};

use super::config::CacheConfig;
use super::keys::glob_match;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

#[derive(Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

pub struct MemoryCacheStore {
    entries: Mutex<LruCache<String, Entry>>,
}

impl MemoryCacheStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(config.memory_max_entries_non_zero())),
        }
    }

    /// Number of stored entries, including expired ones not yet collected.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live_keys_matching(entries: &mut LruCache<String, Entry>, pattern: &str) -> Vec<String> {
        let now = Instant::now();
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }

        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        let expired = match entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        Ok(None)
    }

    async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        if ttl.is_zero() {
            return Err(CacheError::Command(format!(
                "invalid expire time for key `{key}`"
            )));
        }
        let expires_at = Instant::now().checked_add(ttl).ok_or_else(|| {
            CacheError::Command(format!("invalid expire time for key `{key}`"))
        })?;
        let entry = Entry { value, expires_at };
        mutex_lock(&self.entries, SOURCE, "set_ex").put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        let removed = mutex_lock(&self.entries, SOURCE, "delete").pop(key);
        Ok(removed.is_some_and(|entry| entry.is_live(Instant::now())))
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "delete_pattern");
        let keys = Self::live_keys_matching(&mut entries, pattern);
        for key in &keys {
            entries.pop(key);
        }
        Ok(keys.len() as u64)
    }

    async fn flush_all(&self) -> Result<(), CacheError> {
        mutex_lock(&self.entries, SOURCE, "flush_all").clear();
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, CacheError> {
        let mut entries = mutex_lock(&self.entries, SOURCE, "keys");
        Ok(Self::live_keys_matching(&mut entries, pattern))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;

    const TTL: Duration = Duration::from_secs(60);

    fn store() -> MemoryCacheStore {
        MemoryCacheStore::new(&CacheConfig::default())
    }

    #[tokio::test]
    async fn set_get_delete_roundtrip() {
        let store = store();

        assert_eq!(store.get("record:1").await.unwrap(), None);
        store
            .set_ex("record:1", "{}".to_string(), TTL)
            .await
            .unwrap();
        assert_eq!(
            store.get("record:1").await.unwrap().as_deref(),
            Some("{}")
        );

        assert!(store.delete("record:1").await.unwrap());
        assert!(!store.delete("record:1").await.unwrap());
        assert_eq!(store.get("record:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let store = store();
        store
            .set_ex("record:short", "1".to_string(), Duration::from_millis(20))
            .await
            .unwrap();
        store
            .set_ex("record:long", "2".to_string(), TTL)
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(store.get("record:short").await.unwrap(), None);
        assert_eq!(
            store.keys("record:*").await.unwrap(),
            vec!["record:long".to_string()]
        );
    }

    #[tokio::test]
    async fn zero_ttl_is_rejected() {
        let store = store();
        let err = store
            .set_ex("record:1", "1".to_string(), Duration::ZERO)
            .await
            .expect_err("zero ttl");
        assert!(matches!(err, CacheError::Command(_)));
    }

    #[tokio::test]
    async fn unrepresentable_ttl_is_rejected() {
        let store = store();
        let err = store
            .set_ex("record:1", "1".to_string(), Duration::from_secs(u64::MAX))
            .await
            .expect_err("ttl past the end of time");
        assert!(matches!(err, CacheError::Command(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn pattern_operations_only_touch_matching_keys() {
        let store = store();
        for key in ["record:a", "record:b", "records:all"] {
            store.set_ex(key, "x".to_string(), TTL).await.unwrap();
        }

        assert_eq!(
            store.keys("record:*").await.unwrap(),
            vec!["record:a".to_string(), "record:b".to_string()]
        );
        assert_eq!(store.delete_pattern("record:*").await.unwrap(), 2);
        assert_eq!(
            store.keys("*").await.unwrap(),
            vec!["records:all".to_string()]
        );

        store.flush_all().await.unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let store = MemoryCacheStore::new(&CacheConfig {
            memory_max_entries: 2,
            ..Default::default()
        });

        store.set_ex("record:1", "1".to_string(), TTL).await.unwrap();
        store.set_ex("record:2", "2".to_string(), TTL).await.unwrap();
        // Touch 1 so 2 becomes the eviction candidate.
        assert!(store.get("record:1").await.unwrap().is_some());
        store.set_ex("record:3", "3".to_string(), TTL).await.unwrap();

        assert!(store.get("record:1").await.unwrap().is_some());
        assert!(store.get("record:2").await.unwrap().is_none());
        assert!(store.get("record:3").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn store_recovers_from_poisoned_lock() {
        let store = store();

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store.entries.lock().expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        store.set_ex("record:1", "1".to_string(), TTL).await.unwrap();
        assert!(store.get("record:1").await.unwrap().is_some());
    }
}
