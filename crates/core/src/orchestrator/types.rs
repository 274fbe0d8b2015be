//! Types for the transcode orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::AuthError;
use crate::progress::RunId;

/// Errors returned synchronously by `start_transcode`.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The request is malformed (empty key, key without a file name).
    #[error("{0}")]
    InvalidInput(String),

    /// The requester may not start transcodes.
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthError),

    /// The source cannot be processed (missing, store unreachable).
    #[error("processing failed: {details}")]
    ProcessingFailed { details: String },

    /// Both the worker pool and the wait queue are full.
    #[error("transcode queue is full")]
    QueueFull,
}

impl OrchestratorError {
    /// Short label for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Unauthorized(_) => "unauthorized",
            Self::ProcessingFailed { .. } => "processing_failed",
            Self::QueueFull => "queue_full",
        }
    }
}

/// An accepted transcode job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartedTranscode {
    /// Normalized source key; also the progress key.
    pub video_key: String,
    /// Where the master playlist will be written.
    pub hls_key: String,
    pub run_id: RunId,
}

/// Status of the worker pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    /// Number of running jobs.
    pub active_jobs: usize,
    /// Number of accepted jobs waiting for a worker.
    pub queued_jobs: usize,
    pub max_concurrent: usize,
    pub max_queued: usize,
    /// Runs finished successfully since startup.
    pub total_completed: u64,
    /// Runs failed since startup.
    pub total_failed: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind() {
        assert_eq!(OrchestratorError::QueueFull.kind(), "queue_full");
        assert_eq!(
            OrchestratorError::from(AuthError::NotAuthenticated).kind(),
            "unauthorized"
        );
    }

    #[test]
    fn test_started_transcode_serialization() {
        let started = StartedTranscode {
            video_key: "uploads/lecture1.mp4".to_string(),
            hls_key: "hls/lecture1/master.m3u8".to_string(),
            run_id: RunId(7),
        };
        let json = serde_json::to_value(&started).unwrap();
        assert_eq!(json["hls_key"], "hls/lecture1/master.m3u8");
        assert_eq!(json["run_id"], 7);
    }
}
