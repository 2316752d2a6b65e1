//! Batch refresh coordination.
//!
//! Drives one refresh batch: sorts the entries so dependencies come first,
//! then walks the order invoking each entry's loader and applying the outcome
//! to the store. A single entry's failure is recorded and never aborts the
//! batch; only a dependency cycle is batch-fatal, and it is detected before
//! any store mutation.

use std::fmt;
use std::time::Instant;

use metrics::{counter, histogram};
use time::OffsetDateTime;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::entry::{Entry, EntryKey};
use crate::error::{RefreshError, RefreshFailure};
use crate::graph::DependencyGraph;
use crate::store::CacheStore;

const METRIC_REFRESH_BATCH_MS: &str = "rinfresco_refresh_batch_ms";
const METRIC_ENTRIES_REFRESHED_TOTAL: &str = "rinfresco_entries_refreshed_total";
const METRIC_ENTRIES_EVICTED_TOTAL: &str = "rinfresco_entries_evicted_total";
const METRIC_ENTRIES_FAILED_TOTAL: &str = "rinfresco_entries_failed_total";

/// A failed entry with its attributed cause.
#[derive(Debug)]
pub struct FailedRefresh {
    pub key: EntryKey,
    pub cause: RefreshFailure,
}

/// Outcome of one refresh batch.
#[derive(Debug)]
pub struct BatchResult {
    /// Correlation id for log lines belonging to this batch.
    pub batch_id: Uuid,
    /// When the batch started.
    pub started_at: OffsetDateTime,
    /// Keys refreshed with a new value, in refresh order.
    pub refreshed: Vec<EntryKey>,
    /// Keys removed after their loader returned no value, in refresh order.
    pub evicted: Vec<EntryKey>,
    /// Entries whose refresh failed, with causes.
    pub failed: Vec<FailedRefresh>,
}

impl BatchResult {
    fn new() -> Self {
        Self {
            batch_id: Uuid::new_v4(),
            started_at: OffsetDateTime::now_utc(),
            refreshed: Vec::new(),
            evicted: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// True when every entry refreshed or evicted cleanly.
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl fmt::Display for BatchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BatchResult {{ refreshed: {}, evicted: {}, failed: {} }}",
            self.refreshed.len(),
            self.evicted.len(),
            self.failed.len(),
        )
    }
}

enum EntryOutcome {
    Refreshed,
    Evicted,
}

/// Coordinates refresh batches over a cache store.
pub struct Refresher {
    config: EngineConfig,
}

impl Refresher {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Refresh a batch of entries against the store.
    ///
    /// The batch is sorted topologically first; a dependency cycle fails the
    /// whole batch before any entry is touched. Everything else is per-entry:
    /// failures are recorded in the result and the walk continues, so a
    /// dependent may be refreshed against a stale dependency after that
    /// dependency's loader failed. That degradation is logged, not hidden.
    #[instrument(skip_all, fields(batch_size = entries.len()))]
    pub async fn refresh_batch<V, S>(
        &self,
        mut entries: Vec<Entry<V>>,
        store: &S,
    ) -> Result<BatchResult, RefreshError>
    where
        V: Clone + Send + Sync,
        S: CacheStore<V> + ?Sized,
    {
        let batch_started_at = Instant::now();
        let mut result = BatchResult::new();

        let limit = self.config.refresh_batch_limit_non_zero().get();
        if entries.len() > limit {
            // Truncate before sorting; cutting a sorted order could emit a
            // dependent without its dependency.
            warn!(
                batch_id = %result.batch_id,
                submitted = entries.len(),
                limit,
                dropped = entries.len() - limit,
                "Refresh batch over limit, truncating"
            );
            entries.truncate(limit);
        }

        let ordered = DependencyGraph::build(entries).sort_topologically()?;

        info!(
            batch_id = %result.batch_id,
            entries = ordered.len(),
            "Refresh batch starting"
        );

        for entry in ordered {
            let key = entry.key.clone();
            match self.refresh_entry(entry, store).await {
                Ok(EntryOutcome::Refreshed) => result.refreshed.push(key),
                Ok(EntryOutcome::Evicted) => result.evicted.push(key),
                Err(cause) => {
                    warn!(
                        batch_id = %result.batch_id,
                        entry = %key,
                        error = %cause,
                        "Refresh failed, continuing batch"
                    );
                    result.failed.push(FailedRefresh { key, cause });
                }
            }
        }

        counter!(METRIC_ENTRIES_REFRESHED_TOTAL).increment(result.refreshed.len() as u64);
        counter!(METRIC_ENTRIES_EVICTED_TOTAL).increment(result.evicted.len() as u64);
        counter!(METRIC_ENTRIES_FAILED_TOTAL).increment(result.failed.len() as u64);
        histogram!(METRIC_REFRESH_BATCH_MS)
            .record(batch_started_at.elapsed().as_secs_f64() * 1000.0);

        info!(
            batch_id = %result.batch_id,
            result = %result,
            "Refresh batch complete"
        );

        Ok(result)
    }

    /// Refresh a single entry.
    ///
    /// The loader runs without any store lock held; the store is only touched
    /// to apply the outcome. A loader returning no value evicts the entry.
    async fn refresh_entry<V, S>(
        &self,
        entry: Entry<V>,
        store: &S,
    ) -> Result<EntryOutcome, RefreshFailure>
    where
        V: Clone + Send + Sync,
        S: CacheStore<V> + ?Sized,
    {
        let Some(loader) = entry.loader.clone() else {
            return Err(RefreshFailure::MissingLoader);
        };

        debug!(entry = %entry.key, "Refreshing cache entry");

        let loaded = loader
            .load(&entry.loader_params)
            .await
            .map_err(RefreshFailure::loader)?;

        match loaded {
            Some(value) => {
                let mut refreshed = entry;
                refreshed.value = value;
                store.put(refreshed).map_err(RefreshFailure::store_write)?;
                Ok(EntryOutcome::Refreshed)
            }
            None => {
                store
                    .remove(&entry.key.scope, &entry.key.key)
                    .map_err(RefreshFailure::store_write)?;
                Ok(EntryOutcome::Evicted)
            }
        }
    }
}

impl Default for Refresher {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
