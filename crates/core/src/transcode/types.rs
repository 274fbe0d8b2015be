//! Types for the transcode engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One output variant of the HLS ladder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rendition {
    /// Directory name under the HLS prefix, e.g. "720p".
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub video_bitrate_kbps: u32,
    pub audio_bitrate_kbps: u32,
}

impl Rendition {
    pub fn new(
        name: impl Into<String>,
        width: u32,
        height: u32,
        video_bitrate_kbps: u32,
        audio_bitrate_kbps: u32,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            video_bitrate_kbps,
            audio_bitrate_kbps,
        }
    }

    /// Peak bandwidth in bits per second, as advertised in the master playlist.
    pub fn bandwidth_bps(&self, with_audio: bool) -> u64 {
        let audio = if with_audio { self.audio_bitrate_kbps } else { 0 };
        (self.video_bitrate_kbps as u64 + audio as u64) * 1000
    }

    /// Output size when a `source` frame is scaled to fit this rendition's
    /// box with its aspect ratio kept and both sides rounded down to even.
    /// Matches ffmpeg's `force_original_aspect_ratio=decrease` with
    /// `force_divisible_by=2`. Unknown source dimensions give the box itself.
    pub fn fitted_size(&self, source: Option<(u32, u32)>) -> (u32, u32) {
        let (src_w, src_h) = match source {
            Some((w, h)) if w > 0 && h > 0 => (w as u64, h as u64),
            _ => return (self.width, self.height),
        };
        let (box_w, box_h) = (self.width as u64, self.height as u64);

        // Rounded to nearest, as av_rescale does
        let w_for_h = (box_h * src_w + src_h / 2) / src_h;
        let h_for_w = (box_w * src_h + src_w / 2) / src_w;
        let w = box_w.min(w_for_h) / 2 * 2;
        let h = box_h.min(h_for_w) / 2 * 2;
        (w.max(2) as u32, h.max(2) as u32)
    }

    /// "WIDTHxHEIGHT" of the fitted output.
    pub fn resolution(&self, source: Option<(u32, u32)>) -> String {
        let (w, h) = self.fitted_size(source);
        format!("{}x{}", w, h)
    }
}

/// Information about a probed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaInfo {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub duration_secs: f64,
    /// Container format (first entry of ffprobe's format_name).
    pub format: String,
    pub video_codec: Option<String>,
    pub video_width: Option<u32>,
    pub video_height: Option<u32>,
    pub video_fps: Option<f32>,
    pub audio_codec: Option<String>,
    pub audio_channels: Option<u8>,
}

impl MediaInfo {
    pub fn has_video(&self) -> bool {
        self.video_codec.is_some()
    }

    pub fn has_audio(&self) -> bool {
        self.audio_codec.is_some()
    }

    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.video_width.zip(self.video_height)
    }
}

/// Encodes one rendition of a source into a directory.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    /// Identifier used in progress updates and logs.
    pub job_id: String,
    pub input_path: PathBuf,
    /// Receives `index.m3u8` and `segment_NNN.ts`.
    pub output_dir: PathBuf,
    pub rendition: Rendition,
    pub segment_duration_secs: u32,
    /// Source duration from the probe, used to compute progress.
    pub source_duration_secs: Option<f64>,
    pub include_audio: bool,
}

/// Intra-encode progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeProgress {
    pub job_id: String,
    pub rendition: String,
    /// Fraction of the source encoded so far (0.0-1.0).
    pub fraction: f32,
    /// Output timestamp reached, in seconds.
    pub time_secs: f64,
    /// Encoding speed reported by ffmpeg, e.g. "2.5x".
    pub speed: Option<String>,
}

/// Result of a finished encode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodeOutput {
    pub rendition: String,
    pub playlist_path: PathBuf,
    pub duration_ms: u64,
}

/// Pipeline stages in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Probe,
    Encode { rendition: String },
    Manifest,
    Upload,
}

impl Stage {
    /// Stage name without the rendition, for metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Probe => "probe",
            Self::Encode { .. } => "encode",
            Self::Manifest => "manifest",
            Self::Upload => "upload",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encode { rendition } => write!(f, "encode({})", rendition),
            other => f.write_str(other.kind()),
        }
    }
}

/// Summary of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeOutcome {
    pub video_key: String,
    pub hls_key: String,
    /// Renditions written, in master playlist order.
    pub renditions: Vec<String>,
    pub files_written: usize,
    pub bytes_written: u64,
    pub duration_ms: u64,
}
