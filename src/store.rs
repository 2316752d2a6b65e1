//! Cache storage.
//!
//! [`CacheStore`] is the collaborator surface the refresh engine writes back
//! into; [`MemoryStore`] is the default in-memory implementation with
//! registered scopes, per-scope LRU capacity and a tick-driven sweep.

use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};

use lru::LruCache;
use metrics::counter;
use tracing::debug;

use crate::config::EngineConfig;
use crate::entry::{Entry, EntryKey};
use crate::error::StoreError;
use crate::lock::{read_or_recover, write_or_recover};

const METRIC_STORE_HIT_TOTAL: &str = "rinfresco_store_hit_total";
const METRIC_STORE_MISS_TOTAL: &str = "rinfresco_store_miss_total";
const METRIC_STORE_EVICT_TOTAL: &str = "rinfresco_store_evict_total";
const METRIC_STORE_EXPIRED_TOTAL: &str = "rinfresco_store_expired_total";

/// Key/value store the refresh engine reads from and writes back into.
///
/// A put replaces the entry wholesale, so value, counters and loader fields
/// change atomically with respect to concurrent readers of the same key.
pub trait CacheStore<V>: Send + Sync {
    /// Look up an entry.
    fn get(&self, scope: &str, key: &str) -> Result<Option<Entry<V>>, StoreError>;

    /// Insert or replace an entry under its own key.
    fn put(&self, entry: Entry<V>) -> Result<(), StoreError>;

    /// Remove an entry, returning whether it was present.
    fn remove(&self, scope: &str, key: &str) -> Result<bool, StoreError>;
}

/// Scoped in-memory cache store.
///
/// Scopes must be registered with [`add_scope`](MemoryStore::add_scope)
/// before use; operations against unknown scopes fail with
/// [`StoreError::UnknownScope`]. Each scope holds an LRU-bounded map of
/// entries. A monotonic tick counter drives expiry and proactive refresh via
/// [`tick`](MemoryStore::tick); scheduling ticks is the caller's concern.
pub struct MemoryStore<V> {
    config: EngineConfig,
    scopes: RwLock<HashMap<String, LruCache<String, Entry<V>>>>,
    tick: AtomicU64,
}

impl<V> MemoryStore<V> {
    /// Create an empty store with the given configuration.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            config: config.clone(),
            scopes: RwLock::new(HashMap::new()),
            tick: AtomicU64::new(0),
        }
    }

    /// Register a scope. Registering an existing scope leaves it untouched.
    pub fn add_scope(&self, scope: impl Into<String>) {
        let mut scopes = write_or_recover(&self.scopes, "add_scope");
        scopes
            .entry(scope.into())
            .or_insert_with(|| LruCache::new(self.config.scope_entry_limit_non_zero()));
    }

    /// Drop a scope and everything in it. Returns whether it existed.
    pub fn remove_scope(&self, scope: &str) -> bool {
        write_or_recover(&self.scopes, "remove_scope")
            .remove(scope)
            .is_some()
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        read_or_recover(&self.scopes, "has_scope").contains_key(scope)
    }

    /// Registered scope names, sorted.
    pub fn scopes(&self) -> Vec<String> {
        let mut names: Vec<String> = read_or_recover(&self.scopes, "scopes")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Number of entries in a scope.
    pub fn len(&self, scope: &str) -> Result<usize, StoreError> {
        read_or_recover(&self.scopes, "len")
            .get(scope)
            .map(LruCache::len)
            .ok_or_else(|| StoreError::unknown_scope(scope))
    }

    /// Remove all entries from a scope, keeping the scope registered.
    pub fn clear_scope(&self, scope: &str) -> Result<(), StoreError> {
        write_or_recover(&self.scopes, "clear_scope")
            .get_mut(scope)
            .map(LruCache::clear)
            .ok_or_else(|| StoreError::unknown_scope(scope))
    }

    /// Remove all entries from every scope.
    pub fn clear_all(&self) {
        for cache in write_or_recover(&self.scopes, "clear_all").values_mut() {
            cache.clear();
        }
    }

    /// Current sweep tick.
    pub fn current_tick(&self) -> u64 {
        self.tick.load(Ordering::SeqCst)
    }
}

impl<V: Clone> MemoryStore<V> {
    /// Advance the sweep tick: drop expired entries and return the entries
    /// due for proactive refresh, sorted by key for reproducible batches.
    ///
    /// An entry that is both expired and due is dropped, not refreshed.
    pub fn tick(&self) -> Vec<Entry<V>> {
        let current = self.tick.fetch_add(1, Ordering::SeqCst) + 1;

        let mut expired: Vec<EntryKey> = Vec::new();
        let mut due: Vec<Entry<V>> = Vec::new();

        let mut scopes = write_or_recover(&self.scopes, "tick");
        for cache in scopes.values_mut() {
            let mut drop_keys: Vec<String> = Vec::new();
            for (key, entry) in cache.iter() {
                if entry.is_expired(current) {
                    drop_keys.push(key.clone());
                    expired.push(entry.key.clone());
                } else if entry.needs_refresh(current) {
                    due.push(entry.clone());
                }
            }
            for key in drop_keys {
                cache.pop(&key);
            }
        }
        drop(scopes);

        if !expired.is_empty() {
            counter!(METRIC_STORE_EXPIRED_TOTAL).increment(expired.len() as u64);
            debug!(tick = current, expired = ?expired, "Sweep dropped expired entries");
        }

        due.sort_by(|a, b| a.key.cmp(&b.key));
        due
    }
}

impl<V: Clone + Send + Sync> CacheStore<V> for MemoryStore<V> {
    fn get(&self, scope: &str, key: &str) -> Result<Option<Entry<V>>, StoreError> {
        let mut scopes = write_or_recover(&self.scopes, "get");
        let cache = scopes
            .get_mut(scope)
            .ok_or_else(|| StoreError::unknown_scope(scope))?;
        let entry = cache.get(key).cloned();
        if entry.is_some() {
            counter!(METRIC_STORE_HIT_TOTAL).increment(1);
        } else {
            counter!(METRIC_STORE_MISS_TOTAL).increment(1);
        }
        Ok(entry)
    }

    fn put(&self, mut entry: Entry<V>) -> Result<(), StoreError> {
        entry.tick_added = self.current_tick();

        let mut scopes = write_or_recover(&self.scopes, "put");
        let cache = scopes
            .get_mut(&entry.key.scope)
            .ok_or_else(|| StoreError::unknown_scope(&entry.key.scope))?;
        let key = entry.key.clone();
        if let Some((evicted_key, evicted)) = cache.push(key.key.clone(), entry)
            && evicted_key != key.key
        {
            counter!(METRIC_STORE_EVICT_TOTAL).increment(1);
            debug!(scope = %key.scope, evicted = %evicted.key, "Capacity eviction");
        }
        Ok(())
    }

    fn remove(&self, scope: &str, key: &str) -> Result<bool, StoreError> {
        let mut scopes = write_or_recover(&self.scopes, "remove");
        let cache = scopes
            .get_mut(scope)
            .ok_or_else(|| StoreError::unknown_scope(scope))?;
        Ok(cache.pop(key).is_some())
    }
}
