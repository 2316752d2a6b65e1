//! Cache entry types.
//!
//! An [`Entry`] is a cached value plus the metadata the refresh engine needs:
//! the keys its computation consumed, tick counters controlling eviction and
//! proactive refresh, and the loader that recomputes it.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::loader::Loader;

/// Disables expiry or proactive refresh when used for the respective counter.
pub const NEVER: u64 = 0;

/// Addresses a cache entry: a namespace scope plus an opaque key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey {
    pub scope: String,
    pub key: String,
}

impl EntryKey {
    pub fn new(scope: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            scope: scope.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[scope='{}', key={}]", self.scope, self.key)
    }
}

/// A cached value plus its refresh metadata.
///
/// Entries are replaced wholesale on refresh: the value changes, the store
/// restamps `tick_added`, and everything else is preserved.
#[derive(Clone)]
pub struct Entry<V> {
    pub key: EntryKey,
    pub value: V,
    /// Keys this entry's computation consumed.
    pub dependency_keys: HashSet<EntryKey>,
    /// Sweep ticks until the entry is dropped. [`NEVER`] disables expiry.
    pub ticks_to_expire: u64,
    /// Sweep ticks until the entry is due for proactive refresh. [`NEVER`]
    /// disables it.
    pub ticks_to_refresh: u64,
    /// Store tick at which the entry was last written. Maintained by the store.
    pub tick_added: u64,
    /// Recomputation capability. Entries without one cannot be refreshed.
    pub loader: Option<Arc<dyn Loader<V>>>,
    /// Opaque arguments passed to the loader.
    pub loader_params: Vec<Value>,
}

impl<V> Entry<V> {
    /// Create an entry with no dependencies, no expiry and no loader.
    pub fn new(key: EntryKey, value: V) -> Self {
        Self {
            key,
            value,
            dependency_keys: HashSet::new(),
            ticks_to_expire: NEVER,
            ticks_to_refresh: NEVER,
            tick_added: 0,
            loader: None,
            loader_params: Vec::new(),
        }
    }

    /// Declare the keys this entry's computation consumed.
    pub fn with_dependencies(mut self, keys: impl IntoIterator<Item = EntryKey>) -> Self {
        self.dependency_keys = keys.into_iter().collect();
        self
    }

    /// Set the expiry and proactive-refresh tick counters.
    pub fn with_ticks(mut self, ticks_to_expire: u64, ticks_to_refresh: u64) -> Self {
        self.ticks_to_expire = ticks_to_expire;
        self.ticks_to_refresh = ticks_to_refresh;
        self
    }

    /// Attach the recomputation loader and its arguments.
    pub fn with_loader(mut self, loader: Arc<dyn Loader<V>>, params: Vec<Value>) -> Self {
        self.loader = Some(loader);
        self.loader_params = params;
        self
    }

    /// Age of the entry in sweep ticks.
    pub fn age(&self, current_tick: u64) -> u64 {
        current_tick.saturating_sub(self.tick_added)
    }

    /// Whether the sweep should drop this entry.
    pub fn is_expired(&self, current_tick: u64) -> bool {
        self.ticks_to_expire != NEVER && self.age(current_tick) >= self.ticks_to_expire
    }

    /// Whether the sweep should hand this entry to the refresher.
    pub fn needs_refresh(&self, current_tick: u64) -> bool {
        self.ticks_to_refresh != NEVER && self.age(current_tick) >= self.ticks_to_refresh
    }
}

impl<V> fmt::Debug for Entry<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("dependency_keys", &self.dependency_keys)
            .field("ticks_to_expire", &self.ticks_to_expire)
            .field("ticks_to_refresh", &self.ticks_to_refresh)
            .field("tick_added", &self.tick_added)
            .field("has_loader", &self.loader.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_format() {
        let key = EntryKey::new("blog", "post-1");
        assert_eq!(key.to_string(), "[scope='blog', key=post-1]");
    }

    #[test]
    fn key_equality_and_hash() {
        let key1 = EntryKey::new("blog", "post-1");
        let key2 = EntryKey::new("blog", "post-1");
        assert_eq!(key1, key2);
        assert_ne!(key1, EntryKey::new("pages", "post-1"));

        let mut set = HashSet::new();
        set.insert(key1);
        assert!(set.contains(&key2));
    }

    #[test]
    fn never_disables_expiry_and_refresh() {
        let entry = Entry::new(EntryKey::new("blog", "post-1"), "v");
        assert!(!entry.is_expired(u64::MAX));
        assert!(!entry.needs_refresh(u64::MAX));
    }

    #[test]
    fn age_checks_against_tick_added() {
        let mut entry = Entry::new(EntryKey::new("blog", "post-1"), "v").with_ticks(10, 5);
        entry.tick_added = 3;

        assert!(!entry.is_expired(12)); // age 9
        assert!(entry.is_expired(13)); // age 10
        assert!(!entry.needs_refresh(7)); // age 4
        assert!(entry.needs_refresh(8)); // age 5
    }

    #[test]
    fn builder_collects_dependencies() {
        let entry = Entry::new(EntryKey::new("blog", "index"), "v").with_dependencies(vec![
            EntryKey::new("blog", "post-1"),
            EntryKey::new("blog", "post-2"),
            EntryKey::new("blog", "post-1"),
        ]);
        assert_eq!(entry.dependency_keys.len(), 2);
    }
}
