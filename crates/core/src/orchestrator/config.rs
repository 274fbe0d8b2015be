//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the transcode worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum engine runs executing at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_jobs: usize,

    /// Maximum accepted jobs waiting for a worker.
    /// Start requests beyond this are rejected with "queue full".
    #[serde(default = "default_max_queued")]
    pub max_queued_jobs: usize,
}

fn default_max_concurrent() -> usize {
    2
}

fn default_max_queued() -> usize {
    16
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent(),
            max_queued_jobs: default_max_queued(),
        }
    }
}
