use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics_util::debugging::{DebugValue, DebuggingRecorder};
use serde_json::json;

use recache::application::records::RecordService;
use recache::application::repos::{CacheError, CacheStore};
use recache::cache::{
    CacheConfig, METRIC_CACHE_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_MISS, MemoryCacheStore,
};
use recache::infra::memory::InMemoryDocumentStore;
use recache::infra::telemetry;

struct RefusingCache;

#[async_trait]
impl CacheStore for RefusingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Unreachable("refused".into()))
    }

    async fn set_ex(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), CacheError> {
        Err(CacheError::Unreachable("refused".into()))
    }

    async fn delete(&self, _key: &str) -> Result<bool, CacheError> {
        Err(CacheError::Unreachable("refused".into()))
    }

    async fn delete_pattern(&self, _pattern: &str) -> Result<u64, CacheError> {
        Err(CacheError::Unreachable("refused".into()))
    }

    async fn flush_all(&self) -> Result<(), CacheError> {
        Err(CacheError::Unreachable("refused".into()))
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, CacheError> {
        Err(CacheError::Unreachable("refused".into()))
    }

    async fn ping(&self) -> Result<(), CacheError> {
        Err(CacheError::Unreachable("refused".into()))
    }
}

#[tokio::test]
async fn cache_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");
    telemetry::describe_metrics();

    let config = CacheConfig::default();
    let healthy = RecordService::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(MemoryCacheStore::new(&config)),
        config.clone(),
    );

    // list miss, list hit, record hit
    let id = healthy.create(json!({"n": 1})).await.expect("create");
    healthy.list_all().await.expect("list");
    healthy.list_all().await.expect("list");
    healthy.get_one(&id).await.expect("get");

    // get, set and delete failures
    let degraded = RecordService::new(
        Arc::new(InMemoryDocumentStore::new()),
        Arc::new(RefusingCache),
        config,
    );
    let id = degraded.create(json!({"n": 1})).await.expect("create");
    degraded.get_one(&id).await.expect("get");

    let counters: Vec<(String, Vec<(String, String)>, u64)> = snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .filter_map(|(composite_key, _, _, value)| match value {
            DebugValue::Counter(count) => {
                let key = composite_key.key();
                let labels = key
                    .labels()
                    .map(|label| (label.key().to_string(), label.value().to_string()))
                    .collect();
                Some((key.name().to_string(), labels, count))
            }
            _ => None,
        })
        .collect();

    let observed: HashSet<(String, String, String)> = counters
        .iter()
        .flat_map(|(name, labels, _)| {
            labels
                .iter()
                .map(move |(key, value)| (name.clone(), key.clone(), value.clone()))
        })
        .collect();

    let expected = [
        (METRIC_CACHE_MISS, "scope", "list"),
        (METRIC_CACHE_HIT, "scope", "list"),
        (METRIC_CACHE_HIT, "scope", "record"),
        (METRIC_CACHE_MISS, "scope", "record"),
        (METRIC_CACHE_ERROR, "op", "get"),
        (METRIC_CACHE_ERROR, "op", "set"),
        (METRIC_CACHE_ERROR, "op", "delete"),
    ];

    for (name, key, value) in expected {
        assert!(
            observed.contains(&(name.to_string(), key.to_string(), value.to_string())),
            "missing metric: {name}{{{key}=\"{value}\"}}"
        );
    }

    assert_eq!(METRIC_CACHE_HIT, "recache_cache_hit_total");
    assert_eq!(METRIC_CACHE_MISS, "recache_cache_miss_total");
    assert_eq!(METRIC_CACHE_ERROR, "recache_cache_error_total");
}
