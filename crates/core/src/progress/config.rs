//! Configuration for the progress tracker.

use serde::{Deserialize, Serialize};

/// Longest accepted retention for finished entries (30 days).
pub const MAX_RETENTION_SECS: u64 = 30 * 24 * 60 * 60;

/// Retention settings for progress entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// How long a finished or failed entry stays visible, in seconds.
    #[serde(default = "default_retention")]
    pub retention_secs: u64,

    /// How often the sweeper evicts expired entries, in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_retention() -> u64 {
    3600 // 1 hour
}

fn default_sweep_interval() -> u64 {
    60
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProgressConfig::default();
        assert_eq!(config.retention_secs, 3600);
        assert_eq!(config.sweep_interval_secs, 60);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ProgressConfig = toml::from_str("retention_secs = 120").unwrap();
        assert_eq!(config.retention_secs, 120);
        assert_eq!(config.sweep_interval_secs, 60);
    }
}
