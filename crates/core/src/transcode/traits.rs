//! Trait definitions for the transcode module.

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use super::error::ToolchainError;
use super::types::{EncodeJob, EncodeOutput, EncodeProgress, MediaInfo};

/// External media toolchain used by the engine to probe and encode.
#[async_trait]
pub trait Toolchain: Send + Sync {
    /// Returns the name of this toolchain implementation.
    fn name(&self) -> &str;

    /// Probes a local media file.
    async fn probe(&self, path: &Path) -> Result<MediaInfo, ToolchainError>;

    /// Encodes one rendition into `job.output_dir`.
    ///
    /// Progress updates are best-effort; a full or closed channel never
    /// fails the encode.
    async fn encode(
        &self,
        job: EncodeJob,
        progress_tx: Option<mpsc::Sender<EncodeProgress>>,
    ) -> Result<EncodeOutput, ToolchainError>;

    /// Validates that the toolchain is installed and usable.
    async fn validate(&self) -> Result<(), ToolchainError>;
}
