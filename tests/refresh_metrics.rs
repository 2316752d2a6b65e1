//! Verifies the engine emits its documented metric series.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use metrics_util::debugging::DebuggingRecorder;
use rinfresco::{
    CacheStore, EngineConfig, Entry, EntryKey, Loader, LoaderError, MemoryStore, NEVER, Refresher,
};
use serde_json::Value;
use serial_test::serial;

struct StaticLoader {
    value: Option<String>,
}

#[async_trait]
impl Loader<String> for StaticLoader {
    async fn load(&self, _params: &[Value]) -> Result<Option<String>, LoaderError> {
        Ok(self.value.clone())
    }
}

fn loader(value: Option<&str>) -> Arc<dyn Loader<String>> {
    Arc::new(StaticLoader {
        value: value.map(str::to_string),
    })
}

#[tokio::test]
#[serial]
async fn engine_paths_emit_expected_metric_keys() {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    recorder
        .install()
        .expect("debug metrics recorder should install in this test process");

    rinfresco::describe_metrics();

    // Store hit/miss/evict: capacity 1 forces an eviction.
    let tight = EngineConfig {
        scope_entry_limit: 1,
        ..Default::default()
    };
    let store: MemoryStore<String> = MemoryStore::new(&tight);
    store.add_scope("s");
    store
        .put(Entry::new(EntryKey::new("s", "first"), "v".to_string()))
        .expect("put");
    assert!(store.get("s", "first").expect("known scope").is_some()); // hit
    store
        .put(Entry::new(EntryKey::new("s", "second"), "v".to_string()))
        .expect("put"); // evicts "first"
    assert!(store.get("s", "first").expect("known scope").is_none()); // miss

    // Sweep expiry.
    store
        .put(Entry::new(EntryKey::new("s", "doomed"), "v".to_string()).with_ticks(1, NEVER))
        .expect("put");
    store.tick();

    // Batch with one refresh, one tombstone and one missing loader.
    let refresher = Refresher::new(EngineConfig::default());
    let batch = vec![
        Entry::new(EntryKey::new("s", "ok"), "stale".to_string())
            .with_loader(loader(Some("fresh")), Vec::new()),
        Entry::new(EntryKey::new("s", "gone"), "stale".to_string())
            .with_loader(loader(None), Vec::new()),
        Entry::new(EntryKey::new("s", "no-loader"), "stale".to_string()),
    ];
    let result = refresher
        .refresh_batch(batch, &store)
        .await
        .expect("acyclic batch");
    assert_eq!(result.refreshed.len(), 1);
    assert_eq!(result.evicted.len(), 1);
    assert_eq!(result.failed.len(), 1);

    let snapshot = snapshotter.snapshot().into_vec();
    let keys: HashSet<String> = snapshot
        .iter()
        .map(|(composite_key, _, _, _)| composite_key.key().name().to_string())
        .collect();

    for expected in [
        "rinfresco_store_hit_total",
        "rinfresco_store_miss_total",
        "rinfresco_store_evict_total",
        "rinfresco_store_expired_total",
        "rinfresco_entries_refreshed_total",
        "rinfresco_entries_evicted_total",
        "rinfresco_entries_failed_total",
        "rinfresco_refresh_batch_ms",
    ] {
        assert!(keys.contains(expected), "missing metric key: {expected}");
    }
}
