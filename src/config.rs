//! Engine configuration.
//!
//! Controls the in-memory store capacity and refresh batch sizing.

use std::num::NonZeroUsize;

use serde::Deserialize;

// Default values for engine configuration
const DEFAULT_SCOPE_ENTRY_LIMIT: usize = 500;
const DEFAULT_REFRESH_BATCH_LIMIT: usize = 100;

/// Refresh engine configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum entries held per scope before LRU eviction.
    pub scope_entry_limit: usize,
    /// Maximum entries processed per refresh batch.
    pub refresh_batch_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scope_entry_limit: DEFAULT_SCOPE_ENTRY_LIMIT,
            refresh_batch_limit: DEFAULT_REFRESH_BATCH_LIMIT,
        }
    }
}

impl EngineConfig {
    /// Returns the per-scope entry limit as NonZeroUsize, clamping to 1 if zero.
    pub fn scope_entry_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.scope_entry_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the refresh batch limit, clamping to 1 if zero.
    pub fn refresh_batch_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.refresh_batch_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = EngineConfig::default();
        assert_eq!(config.scope_entry_limit, 500);
        assert_eq!(config.refresh_batch_limit, 100);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = EngineConfig {
            scope_entry_limit: 0,
            refresh_batch_limit: 0,
        };
        assert_eq!(config.scope_entry_limit_non_zero().get(), 1);
        assert_eq!(config.refresh_batch_limit_non_zero().get(), 1);
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").expect("empty config");
        assert_eq!(config.scope_entry_limit, 500);

        let config: EngineConfig =
            serde_json::from_str(r#"{"refresh_batch_limit": 7}"#).expect("partial config");
        assert_eq!(config.refresh_batch_limit, 7);
        assert_eq!(config.scope_entry_limit, 500);
    }
}
