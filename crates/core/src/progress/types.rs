//! Types for job progress tracking.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one run of a transcode job.
///
/// Issued by the tracker on `begin`; writes carrying an older id are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run-{}", self.0)
    }
}

/// State of a transcode job as seen by pollers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum JobState {
    /// Accepted, waiting for a worker.
    Pending,
    /// A run is active.
    Running { percent: u8 },
    /// The run stopped at `stage`; `percent` is the last value reached.
    Failed {
        percent: u8,
        stage: String,
        reason: String,
    },
    /// All outputs are written.
    Done,
}

impl JobState {
    /// Completion percentage (0-100).
    pub fn percent(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Running { percent } | Self::Failed { percent, .. } => *percent,
            Self::Done => 100,
        }
    }

    /// Whether no further updates will arrive for this run.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running { .. } => "running",
            Self::Failed { .. } => "failed",
            Self::Done => "done",
        }
    }
}

/// One tracked job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub state: JobState,
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Answer to a status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscodeStatus {
    pub progress: u8,
    pub is_complete: bool,
    pub state: JobState,
}

impl From<JobState> for TranscodeStatus {
    fn from(state: JobState) -> Self {
        let progress = state.percent();
        Self {
            progress,
            is_complete: progress == 100,
            state,
        }
    }
}
