use thiserror::Error;

use crate::entry::EntryKey;

/// Boxed cause produced by a failing [`Loader`](crate::Loader).
pub type LoaderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Batch-fatal refresh error.
///
/// A cycle is detected before any entry is refreshed, so the whole batch
/// fails without partial store mutation.
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error("dependency cycle among cache entries: {}", format_keys(keys))]
    CycleDetected { keys: Vec<EntryKey> },
}

impl RefreshError {
    pub fn cycle_detected(keys: Vec<EntryKey>) -> Self {
        Self::CycleDetected { keys }
    }
}

fn format_keys(keys: &[EntryKey]) -> String {
    let rendered: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    rendered.join(", ")
}

/// Per-entry refresh failure, recorded in `BatchResult::failed`.
///
/// None of these abort the batch; the remaining entries still attempt
/// refresh in sorted order.
#[derive(Debug, Error)]
pub enum RefreshFailure {
    #[error("no cache loader configured")]
    MissingLoader,
    #[error("loader failed: {source}")]
    Loader {
        #[source]
        source: LoaderError,
    },
    #[error("store write failed: {source}")]
    StoreWrite {
        #[source]
        source: StoreError,
    },
}

impl RefreshFailure {
    pub fn loader(source: LoaderError) -> Self {
        Self::Loader { source }
    }

    pub fn store_write(source: StoreError) -> Self {
        Self::StoreWrite { source }
    }
}

/// Store-level failure surfaced by [`CacheStore`](crate::CacheStore) operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("cache scope `{scope}` is not registered")]
    UnknownScope { scope: String },
}

impl StoreError {
    pub fn unknown_scope(scope: impl Into<String>) -> Self {
        Self::UnknownScope {
            scope: scope.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_error_lists_participants() {
        let err = RefreshError::cycle_detected(vec![
            EntryKey::new("blog", "a"),
            EntryKey::new("blog", "b"),
        ]);
        let message = err.to_string();
        assert!(message.contains("[scope='blog', key=a]"));
        assert!(message.contains("[scope='blog', key=b]"));
    }

    #[test]
    fn loader_failure_preserves_cause() {
        let cause: LoaderError = "backend unreachable".into();
        let failure = RefreshFailure::loader(cause);
        assert!(failure.to_string().contains("backend unreachable"));
        assert!(std::error::Error::source(&failure).is_some());
    }

    #[test]
    fn unknown_scope_message() {
        let err = StoreError::unknown_scope("missing");
        assert_eq!(err.to_string(), "cache scope `missing` is not registered");
    }
}
