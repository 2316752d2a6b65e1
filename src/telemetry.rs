//! Metric descriptions for the engine's series.
//!
//! The embedding application installs its own `metrics` recorder and tracing
//! subscriber; this module only registers descriptions for the series the
//! engine emits.

use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Register descriptions for every metric the engine emits.
///
/// Safe to call more than once; descriptions are registered a single time.
pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "rinfresco_store_hit_total",
            Unit::Count,
            "Total number of store lookups that found an entry."
        );
        describe_counter!(
            "rinfresco_store_miss_total",
            Unit::Count,
            "Total number of store lookups that found nothing."
        );
        describe_counter!(
            "rinfresco_store_evict_total",
            Unit::Count,
            "Total number of entries evicted due to scope capacity."
        );
        describe_counter!(
            "rinfresco_store_expired_total",
            Unit::Count,
            "Total number of entries dropped by the tick sweep."
        );
        describe_counter!(
            "rinfresco_entries_refreshed_total",
            Unit::Count,
            "Total number of entries refreshed with a new value."
        );
        describe_counter!(
            "rinfresco_entries_evicted_total",
            Unit::Count,
            "Total number of entries removed after a loader returned no value."
        );
        describe_counter!(
            "rinfresco_entries_failed_total",
            Unit::Count,
            "Total number of per-entry refresh failures."
        );
        describe_histogram!(
            "rinfresco_refresh_batch_ms",
            Unit::Milliseconds,
            "Refresh batch latency in milliseconds."
        );
    });
}
