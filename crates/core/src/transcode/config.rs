//! Configuration for the transcode engine.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::types::Rendition;

/// Configuration for the transcode engine and its ffmpeg toolchain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeConfig {
    /// Path to ffmpeg binary.
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,

    /// Path to ffprobe binary.
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,

    /// Scratch directory; each run works in its own subdirectory.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Timeout for a single ffmpeg/ffprobe invocation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Target HLS segment length in seconds.
    #[serde(default = "default_segment_duration")]
    pub segment_duration_secs: u32,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[serde(default = "default_log_level")]
    pub ffmpeg_log_level: String,

    /// Output ladder, highest first.
    #[serde(default = "default_renditions")]
    pub renditions: Vec<Rendition>,

    /// Maximum objects uploaded at once during the upload stage.
    #[serde(default = "default_upload_concurrency")]
    pub upload_concurrency: usize,

    /// Delete the source object after a successful run.
    #[serde(default)]
    pub delete_source: bool,

    /// Additional ffmpeg arguments placed before the output options.
    #[serde(default)]
    pub extra_ffmpeg_args: Vec<String>,
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("hlsmith")
}

fn default_timeout() -> u64 {
    3600 // 1 hour
}

fn default_segment_duration() -> u32 {
    10
}

fn default_log_level() -> String {
    "warning".to_string()
}

fn default_renditions() -> Vec<Rendition> {
    vec![
        Rendition::new("720p", 1280, 720, 2800, 128),
        Rendition::new("480p", 854, 480, 1400, 128),
        Rendition::new("360p", 640, 360, 800, 96),
    ]
}

fn default_upload_concurrency() -> usize {
    4
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
            temp_dir: default_temp_dir(),
            timeout_secs: default_timeout(),
            segment_duration_secs: default_segment_duration(),
            ffmpeg_log_level: default_log_level(),
            renditions: default_renditions(),
            upload_concurrency: default_upload_concurrency(),
            delete_source: false,
            extra_ffmpeg_args: Vec::new(),
        }
    }
}

impl TranscodeConfig {
    /// Sets the scratch directory.
    pub fn with_temp_dir(mut self, temp_dir: PathBuf) -> Self {
        self.temp_dir = temp_dir;
        self
    }

    /// Sets the toolchain timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Replaces the rendition ladder.
    pub fn with_renditions(mut self, renditions: Vec<Rendition>) -> Self {
        self.renditions = renditions;
        self
    }
}
