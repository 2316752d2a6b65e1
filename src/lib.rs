//! Rinfresco: dependency-aware cache refresh engine.
//!
//! Given a batch of cache entries due for renewal, the engine recomputes
//! their values in an order that respects declared inter-entry dependencies,
//! so an entry is never recomputed against a stale version of something it
//! depends on.
//!
//! - **Entries** are addressed by scope + key and carry their dependency
//!   keys, expiry/refresh tick counters and a [`Loader`] that recomputes
//!   them.
//! - **[`DependencyGraph`]** builds a transient graph over one batch and
//!   produces a deterministic topological order, failing on cycles.
//! - **[`Refresher`]** walks that order, invoking each loader and applying
//!   the outcome (update or evict) to the store; per-entry failures are
//!   collected, never fatal to the batch.
//! - **[`MemoryStore`]** is the default scoped store with LRU capacity and a
//!   tick-driven sweep; any [`CacheStore`] implementation can stand in.
//!
//! ## Usage
//!
//! ```ignore
//! let config = EngineConfig::default();
//! let store: MemoryStore<Rendered> = MemoryStore::new(&config);
//! store.add_scope("pages");
//!
//! // On each sweep tick: expire, collect due entries, refresh them.
//! let due = store.tick();
//! let result = Refresher::new(config).refresh_batch(due, &store).await?;
//! tracing::info!(%result, "sweep refresh done");
//! ```

mod config;
mod entry;
mod error;
mod graph;
mod loader;
mod lock;
mod refresher;
mod store;
mod telemetry;

pub use config::EngineConfig;
pub use entry::{Entry, EntryKey, NEVER};
pub use error::{LoaderError, RefreshError, RefreshFailure, StoreError};
pub use graph::DependencyGraph;
pub use loader::Loader;
pub use refresher::{BatchResult, FailedRefresh, Refresher};
pub use store::{CacheStore, MemoryStore};
pub use telemetry::describe_metrics;
