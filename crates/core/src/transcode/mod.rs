//! Transcode engine turning a source video into an HLS package.
//!
//! A run goes through a fixed sequence of stages:
//!
//! - **Fetch**: download the source into a per-run scratch directory
//! - **Probe**: read dimensions and streams, pick the rendition ladder
//! - **Encode**: one ffmpeg invocation per rendition (H.264 baseline + AAC)
//! - **Manifest**: verify variant playlists, write `master.m3u8`
//! - **Upload**: write everything under `hls/<name>/`, master last
//!
//! Progress is reported to the `ProgressTracker` after each stage and,
//! for encodes and uploads, during the stage.
//!
//! # Example
//!
//! ```ignore
//! use hlsmith_core::transcode::{FfmpegToolchain, TranscodeConfig, TranscodeEngine};
//!
//! let config = TranscodeConfig::default();
//! let toolchain = Arc::new(FfmpegToolchain::new(&config));
//! let engine = TranscodeEngine::new(config, store, toolchain, tracker.clone());
//!
//! let run_id = tracker.begin("uploads/lecture1.mp4").await;
//! let outcome = engine.run("uploads/lecture1.mp4", run_id).await?;
//! assert_eq!(outcome.hls_key, "hls/lecture1/master.m3u8");
//! ```

mod config;
mod engine;
mod error;
mod ffmpeg;
mod keys;
mod manifest;
mod schedule;
mod traits;
mod types;

pub use config::TranscodeConfig;
pub use engine::{select_renditions, TranscodeEngine};
pub use error::{EngineCause, EngineError, ToolchainError};
pub use ffmpeg::{FfmpegToolchain, SEGMENT_PATTERN};
pub use keys::{
    basename, extension, hls_key, hls_prefix, normalize_video_key, MASTER_PLAYLIST,
    VARIANT_PLAYLIST,
};
pub use manifest::{
    content_type_for, parse_variant_playlist, render_master_playlist, VariantPlaylist,
};
pub use schedule::StageSchedule;
pub use traits::Toolchain;
pub use types::{
    EncodeJob, EncodeOutput, EncodeProgress, MediaInfo, Rendition, Stage, TranscodeOutcome,
};
