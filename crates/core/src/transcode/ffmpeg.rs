//! FFmpeg-based toolchain implementation.

use async_trait::async_trait;
use regex_lite::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::debug;

use super::config::TranscodeConfig;
use super::error::ToolchainError;
use super::keys::VARIANT_PLAYLIST;
use super::traits::Toolchain;
use super::types::{EncodeJob, EncodeOutput, EncodeProgress, MediaInfo};

/// Segment file pattern handed to ffmpeg.
pub const SEGMENT_PATTERN: &str = "segment_%03d.ts";

/// Toolchain that shells out to ffprobe and ffmpeg.
pub struct FfmpegToolchain {
    ffmpeg_path: PathBuf,
    ffprobe_path: PathBuf,
    temp_dir: PathBuf,
    timeout_secs: u64,
    log_level: String,
    extra_args: Vec<String>,
}

impl FfmpegToolchain {
    pub fn new(config: &TranscodeConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            ffprobe_path: config.ffprobe_path.clone(),
            temp_dir: config.temp_dir.clone(),
            timeout_secs: config.timeout_secs,
            log_level: config.ffmpeg_log_level.clone(),
            extra_args: config.extra_ffmpeg_args.clone(),
        }
    }

    /// Creates a toolchain with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(&TranscodeConfig::default())
    }

    fn spawn_error(&self, e: std::io::Error, binary: &Path, is_probe: bool) -> ToolchainError {
        if e.kind() != std::io::ErrorKind::NotFound {
            return ToolchainError::Io(e);
        }
        let path = binary.to_path_buf();
        if is_probe {
            ToolchainError::FfprobeNotFound { path }
        } else {
            ToolchainError::FfmpegNotFound { path }
        }
    }

    /// Builds ffmpeg arguments for one HLS rendition.
    fn build_hls_args(&self, job: &EncodeJob) -> Vec<String> {
        let rendition = &job.rendition;
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            job.input_path.to_string_lossy().to_string(),
        ];

        // Fit inside the rendition box, keep aspect, even dimensions for yuv420p
        args.extend([
            "-vf".to_string(),
            format!(
                "scale=w={}:h={}:force_original_aspect_ratio=decrease:force_divisible_by=2",
                rendition.width, rendition.height
            ),
        ]);

        // Video codec
        args.extend([
            "-c:v".to_string(),
            "libx264".to_string(),
            "-profile:v".to_string(),
            "baseline".to_string(),
            "-level".to_string(),
            "3.0".to_string(),
            "-pix_fmt".to_string(),
            "yuv420p".to_string(),
            "-b:v".to_string(),
            format!("{}k", rendition.video_bitrate_kbps),
            "-maxrate".to_string(),
            format!("{}k", rendition.video_bitrate_kbps),
            "-bufsize".to_string(),
            format!("{}k", rendition.video_bitrate_kbps * 2),
        ]);

        // Audio codec
        if job.include_audio {
            args.extend([
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                format!("{}k", rendition.audio_bitrate_kbps),
            ]);
        } else {
            args.push("-an".to_string());
        }

        // Extra args
        args.extend(self.extra_args.iter().cloned());

        // HLS muxer
        args.extend([
            "-start_number".to_string(),
            "0".to_string(),
            "-hls_time".to_string(),
            job.segment_duration_secs.to_string(),
            "-hls_list_size".to_string(),
            "0".to_string(),
            "-hls_playlist_type".to_string(),
            "vod".to_string(),
            "-hls_segment_filename".to_string(),
            job.output_dir.join(SEGMENT_PATTERN).to_string_lossy().to_string(),
            "-f".to_string(),
            "hls".to_string(),
        ]);

        // Log level and progress
        args.extend([
            "-loglevel".to_string(),
            self.log_level.clone(),
            "-progress".to_string(),
            "pipe:2".to_string(),
        ]);

        // Output
        args.push(job.output_dir.join(VARIANT_PLAYLIST).to_string_lossy().to_string());

        args
    }

    /// Parses ffprobe JSON output into MediaInfo.
    fn parse_probe_output(path: &Path, output: &str) -> Result<MediaInfo, ToolchainError> {
        #[derive(Deserialize)]
        struct ProbeOutput {
            format: ProbeFormat,
            #[serde(default)]
            streams: Vec<ProbeStream>,
        }

        #[derive(Deserialize)]
        struct ProbeFormat {
            format_name: String,
            duration: Option<String>,
            size: Option<String>,
        }

        #[derive(Deserialize)]
        struct ProbeStream {
            codec_type: String,
            codec_name: Option<String>,
            channels: Option<u8>,
            width: Option<u32>,
            height: Option<u32>,
            r_frame_rate: Option<String>,
        }

        let probe: ProbeOutput =
            serde_json::from_str(output).map_err(|e| ToolchainError::ParseError {
                reason: format!("Failed to parse ffprobe output: {}", e),
            })?;

        let duration_secs = probe
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .unwrap_or(0.0);

        let size_bytes = probe
            .format
            .size
            .as_deref()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        let audio_stream = probe.streams.iter().find(|s| s.codec_type == "audio");
        let video_stream = probe.streams.iter().find(|s| s.codec_type == "video");

        let format_name = probe
            .format
            .format_name
            .split(',')
            .next()
            .unwrap_or("unknown");

        Ok(MediaInfo {
            path: path.to_path_buf(),
            size_bytes,
            duration_secs,
            format: format_name.to_string(),
            video_codec: video_stream.and_then(|s| s.codec_name.clone()),
            video_width: video_stream.and_then(|s| s.width),
            video_height: video_stream.and_then(|s| s.height),
            video_fps: video_stream
                .and_then(|s| s.r_frame_rate.as_deref())
                .and_then(parse_frame_rate),
            audio_codec: audio_stream.and_then(|s| s.codec_name.clone()),
            audio_channels: audio_stream.and_then(|s| s.channels),
        })
    }

    /// Runs ffmpeg for one rendition, streaming progress from stderr.
    async fn run_encode(
        &self,
        job: &EncodeJob,
        progress_tx: Option<mpsc::Sender<EncodeProgress>>,
    ) -> Result<EncodeOutput, ToolchainError> {
        let start = Instant::now();

        tokio::fs::create_dir_all(&job.output_dir).await?;

        let args = self.build_hls_args(job);
        debug!(job_id = %job.job_id, rendition = %job.rendition.name, ?args, "Starting ffmpeg");

        let mut child = Command::new(&self.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e, &self.ffmpeg_path, false))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| ToolchainError::encode_failed("ffmpeg stderr was not captured", None))?;
        let mut reader = BufReader::new(stderr).lines();

        let mut current_time = 0.0;
        let mut current_speed = None;
        let time_regex = Regex::new(r"out_time_ms=(\d+)").ok();
        let speed_regex = Regex::new(r"speed=\s*(\d+\.?\d*)x").ok();

        let timeout_duration = Duration::from_secs(self.timeout_secs);
        let result = timeout(timeout_duration, async {
            let mut last_progress_send = Instant::now();
            let progress_interval = Duration::from_millis(500);
            let mut error_output = String::new();

            while let Ok(Some(line)) = reader.next_line().await {
                if line.contains("Error") || line.contains("error") {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }

                // out_time_ms is in microseconds despite the name
                if let Some(ms) = time_regex
                    .as_ref()
                    .and_then(|re| re.captures(&line))
                    .and_then(|caps| caps.get(1))
                    .and_then(|m| m.as_str().parse::<f64>().ok())
                {
                    current_time = ms / 1_000_000.0;
                }

                if let Some(speed) = speed_regex
                    .as_ref()
                    .and_then(|re| re.captures(&line))
                    .and_then(|caps| caps.get(1))
                {
                    current_speed = Some(format!("{}x", speed.as_str()));
                }

                if let Some(ref tx) = progress_tx {
                    if last_progress_send.elapsed() >= progress_interval {
                        let fraction = match job.source_duration_secs {
                            Some(dur) if dur > 0.0 => (current_time / dur).clamp(0.0, 1.0) as f32,
                            _ => 0.0,
                        };

                        // Non-blocking send
                        let _ = tx.try_send(EncodeProgress {
                            job_id: job.job_id.clone(),
                            rendition: job.rendition.name.clone(),
                            fraction,
                            time_secs: current_time,
                            speed: current_speed.clone(),
                        });
                        last_progress_send = Instant::now();
                    }
                }
            }

            let status = child.wait().await?;
            Ok::<(std::process::ExitStatus, String), std::io::Error>((status, error_output))
        })
        .await;

        match result {
            Ok(Ok((status, error_output))) => {
                if !status.success() {
                    return Err(ToolchainError::encode_failed(
                        format!("FFmpeg exited with code: {:?}", status.code()),
                        if error_output.is_empty() {
                            None
                        } else {
                            Some(error_output)
                        },
                    ));
                }
            }
            Ok(Err(e)) => return Err(ToolchainError::Io(e)),
            Err(_) => {
                let _ = child.kill().await;
                return Err(ToolchainError::Timeout {
                    timeout_secs: self.timeout_secs,
                });
            }
        }

        let playlist_path = job.output_dir.join(VARIANT_PLAYLIST);
        if !tokio::fs::try_exists(&playlist_path).await.unwrap_or(false) {
            return Err(ToolchainError::encode_failed(
                "Variant playlist not created",
                None,
            ));
        }

        Ok(EncodeOutput {
            rendition: job.rendition.name.clone(),
            playlist_path,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Runs `<binary> -version` to check the binary can be spawned.
    async fn check_binary(&self, binary: &Path, is_probe: bool) -> Result<(), ToolchainError> {
        Command::new(binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|_| ())
            .map_err(|e| self.spawn_error(e, binary, is_probe))
    }
}

/// Parses frame rates like "24000/1001" or "30".
fn parse_frame_rate(rate: &str) -> Option<f32> {
    match rate.split_once('/') {
        Some((num, den)) => {
            let num = num.parse::<f32>().ok()?;
            let den = den.parse::<f32>().ok()?;
            (den > 0.0).then(|| num / den)
        }
        None => rate.parse::<f32>().ok(),
    }
}

#[async_trait]
impl Toolchain for FfmpegToolchain {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ToolchainError> {
        if !path.exists() {
            return Err(ToolchainError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let probe = Command::new(&self.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_format",
                "-show_streams",
            ])
            .arg(path)
            .kill_on_drop(true)
            .output();

        let output = timeout(Duration::from_secs(self.timeout_secs), probe)
            .await
            .map_err(|_| ToolchainError::Timeout {
                timeout_secs: self.timeout_secs,
            })?
            .map_err(|e| self.spawn_error(e, &self.ffprobe_path, true))?;

        if !output.status.success() {
            return Err(ToolchainError::probe_failed(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_probe_output(path, &stdout)
    }

    async fn encode(
        &self,
        job: EncodeJob,
        progress_tx: Option<mpsc::Sender<EncodeProgress>>,
    ) -> Result<EncodeOutput, ToolchainError> {
        self.run_encode(&job, progress_tx).await
    }

    async fn validate(&self) -> Result<(), ToolchainError> {
        self.check_binary(&self.ffmpeg_path, false).await?;
        self.check_binary(&self.ffprobe_path, true).await?;

        // Ensure temp dir exists
        tokio::fs::create_dir_all(&self.temp_dir).await?;

        Ok(())
    }
}
