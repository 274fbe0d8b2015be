//! Progress tracking for transcode jobs.
//!
//! Every accepted job gets an entry keyed by its normalized video key. The
//! engine reports stage progress through the tracker and status polls read
//! it back. Entries are memory-only; terminal ones expire after the
//! configured retention.

mod config;
mod tracker;
mod types;

pub use config::{ProgressConfig, MAX_RETENTION_SECS};
pub use tracker::ProgressTracker;
pub use types::{JobState, ProgressEntry, RunId, TranscodeStatus};
