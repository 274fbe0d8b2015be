//! Transcode orchestrator.
//!
//! The orchestrator is the entry point for start requests:
//! - **Validation**: normalize the key, derive the output key
//! - **Authorization**: only administrators may start transcodes
//! - **Dispatch check**: the source must exist in the object store
//! - **Admission**: bounded workers plus a bounded wait queue
//!
//! Accepted jobs run in the background; callers poll `status`.

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::TranscodeOrchestrator;
pub use types::{OrchestratorError, PoolStatus, StartedTranscode};
