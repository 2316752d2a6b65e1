//! Loader capability for recomputing cache entries.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::LoaderError;

/// Recomputes a cache entry's value.
///
/// Returning `Ok(None)` is the tombstone signal: the entry is removed from
/// the store rather than updated, and that is a valid terminal outcome, not
/// an error. A returned error is attributed to the entry being refreshed and
/// never aborts the surrounding batch.
///
/// Loaders may block on I/O; the engine holds no store-wide lock while a
/// loader runs. Timeouts are the loader's own responsibility.
#[async_trait]
pub trait Loader<V>: Send + Sync {
    async fn load(&self, params: &[Value]) -> Result<Option<V>, LoaderError>;
}
