//! Error types for the transcode module.

use std::path::PathBuf;
use thiserror::Error;

use crate::storage::StorageError;

use super::types::Stage;

/// Errors from the external ffmpeg/ffprobe toolchain.
#[derive(Debug, Error)]
pub enum ToolchainError {
    /// FFmpeg binary not found.
    #[error("FFmpeg not found at path: {path}")]
    FfmpegNotFound { path: PathBuf },

    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// FFmpeg ran but did not produce the rendition.
    #[error("Encode failed: {reason}")]
    EncodeFailed {
        reason: String,
        stderr: Option<String>,
    },

    /// The invocation exceeded the configured timeout and was killed.
    #[error("Toolchain timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Failed to probe media file.
    #[error("Failed to probe media file: {reason}")]
    ProbeFailed { reason: String },

    /// Failed to parse FFprobe output.
    #[error("Failed to parse media info: {reason}")]
    ParseError { reason: String },

    /// I/O error while running the toolchain.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ToolchainError {
    /// Creates an encode failure carrying captured stderr.
    pub fn encode_failed(reason: impl Into<String>, stderr: Option<String>) -> Self {
        Self::EncodeFailed {
            reason: reason.into(),
            stderr,
        }
    }

    pub fn probe_failed(reason: impl Into<String>) -> Self {
        Self::ProbeFailed {
            reason: reason.into(),
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Io(_))
    }
}

/// What went wrong inside a stage.
#[derive(Debug, Error)]
pub enum EngineCause {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Toolchain(#[from] ToolchainError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A variant playlist is malformed or references missing segments.
    #[error("Invalid playlist: {reason}")]
    Playlist { reason: String },

    /// The source cannot be turned into HLS (no video stream, no basename).
    #[error("Unsupported source: {reason}")]
    UnsupportedSource { reason: String },
}

/// A failed engine run: the stage it stopped in and why.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {cause}")]
pub struct EngineError {
    pub stage: Stage,
    #[source]
    pub cause: EngineCause,
}

impl EngineError {
    pub fn new(stage: Stage, cause: impl Into<EngineCause>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }

    /// Whether rerunning the job could succeed without changes.
    pub fn is_retryable(&self) -> bool {
        match &self.cause {
            EngineCause::Storage(e) => e.is_retryable(),
            EngineCause::Toolchain(e) => e.is_retryable(),
            EngineCause::Io(_) => true,
            EngineCause::Playlist { .. } | EngineCause::UnsupportedSource { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::new(
            Stage::Encode {
                rendition: "720p".to_string(),
            },
            ToolchainError::encode_failed("FFmpeg exited with code: Some(1)", None),
        );
        assert_eq!(
            err.to_string(),
            "encode(720p) stage failed: Encode failed: FFmpeg exited with code: Some(1)"
        );
    }

    #[test]
    fn test_is_retryable() {
        let timeout = EngineError::new(Stage::Probe, ToolchainError::Timeout { timeout_secs: 5 });
        assert!(timeout.is_retryable());

        let missing = EngineError::new(Stage::Fetch, StorageError::not_found("a.mp4"));
        assert!(!missing.is_retryable());

        let unsupported = EngineError::new(
            Stage::Probe,
            EngineCause::UnsupportedSource {
                reason: "no video stream".to_string(),
            },
        );
        assert!(!unsupported.is_retryable());
    }
}
