//! Runtime configuration for the storage engine.
//!
//! Values are read from the environment at construction time rather than
//! compiled in, since the embedding server starts once per process and the
//! knobs here (listpack node size, expiry sweep cadence) are ordinary
//! operational tuning, not compile-time constants.

use std::time::Duration;

/// Default capacity, in bytes, of a single packed listpack node.
pub const DEFAULT_MAX_LIST_PACK_SIZE: usize = 8192;

/// Default interval between periodic expiry sweeps.
pub const DEFAULT_EXPIRY_SWEEP_INTERVAL: Duration = Duration::from_millis(1000);

/// Configuration for a [`crate::storage::Storage`] instance.
#[derive(Debug, Clone, Copy)]
pub struct StorageConfig {
    /// Maximum byte size of a packed quicklist node. Overridable via
    /// `MAX_LIST_PACK_SIZE`.
    pub max_list_pack_size: usize,
    /// How often the background worker sweeps the KV store for expired
    /// entries. Overridable via `EXPIRY_SWEEP_INTERVAL_MS`.
    pub expiry_sweep_interval: Duration,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            max_list_pack_size: DEFAULT_MAX_LIST_PACK_SIZE,
            expiry_sweep_interval: DEFAULT_EXPIRY_SWEEP_INTERVAL,
        }
    }
}

impl StorageConfig {
    /// Reads `MAX_LIST_PACK_SIZE` and `EXPIRY_SWEEP_INTERVAL_MS` from the
    /// process environment, falling back to the default for any variable
    /// that is absent or fails to parse as a positive integer.
    pub fn from_env() -> Self {
        let mut config = StorageConfig::default();

        if let Ok(raw) = std::env::var("MAX_LIST_PACK_SIZE") {
            match raw.parse::<usize>() {
                Ok(v) if v > 0 => config.max_list_pack_size = v,
                _ => {
                    tracing::warn!(
                        value = %raw,
                        "ignoring invalid MAX_LIST_PACK_SIZE, using default"
                    );
                }
            }
        }

        if let Ok(raw) = std::env::var("EXPIRY_SWEEP_INTERVAL_MS") {
            match raw.parse::<u64>() {
                Ok(v) if v > 0 => config.expiry_sweep_interval = Duration::from_millis(v),
                _ => {
                    tracing::warn!(
                        value = %raw,
                        "ignoring invalid EXPIRY_SWEEP_INTERVAL_MS, using default"
                    );
                }
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_constants() {
        let config = StorageConfig::default();
        assert_eq!(config.max_list_pack_size, 8192);
        assert_eq!(config.expiry_sweep_interval, Duration::from_millis(1000));
    }
}
