//! Mock toolchain for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};

use crate::transcode::{
    EncodeJob, EncodeOutput, EncodeProgress, MediaInfo, Toolchain, ToolchainError,
    VARIANT_PLAYLIST,
};

/// A recorded encode job for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedEncode {
    /// The job that was submitted.
    pub job: EncodeJob,
    /// Whether the encode succeeded.
    pub success: bool,
}

/// Mock implementation of the Toolchain trait.
///
/// Encodes write a real variant playlist and small segment files into the
/// job's output directory so the manifest and upload stages have something
/// to work with.
///
/// Provides controllable behavior for testing:
/// - Track encode jobs for assertions
/// - Fail the probe or a specific rendition
/// - Control probe results
/// - Slow encodes down to observe progress
/// - Panic mid-run
///
/// # Example
///
/// ```rust,ignore
/// use hlsmith_core::testing::MockToolchain;
///
/// let toolchain = MockToolchain::new();
/// toolchain.set_encode_error("480p", ToolchainError::encode_failed("boom", None)).await;
///
/// // ... run the engine ...
///
/// let encodes = toolchain.recorded_encodes().await;
/// assert!(!encodes.last().unwrap().success);
/// ```
#[derive(Debug)]
pub struct MockToolchain {
    encodes: Arc<RwLock<Vec<RecordedEncode>>>,
    probes: Arc<RwLock<Vec<PathBuf>>>,
    media_info: Arc<RwLock<Option<MediaInfo>>>,
    probe_error: Arc<RwLock<Option<ToolchainError>>>,
    encode_errors: Arc<RwLock<HashMap<String, ToolchainError>>>,
    encode_delay: Arc<RwLock<Duration>>,
    segments_per_rendition: Arc<RwLock<usize>>,
    omit_segment_file: Arc<RwLock<bool>>,
    panic_on_probe: Arc<RwLock<bool>>,
}

impl Default for MockToolchain {
    fn default() -> Self {
        Self::new()
    }
}

impl MockToolchain {
    /// Create a new mock toolchain.
    pub fn new() -> Self {
        Self {
            encodes: Arc::new(RwLock::new(Vec::new())),
            probes: Arc::new(RwLock::new(Vec::new())),
            media_info: Arc::new(RwLock::new(None)),
            probe_error: Arc::new(RwLock::new(None)),
            encode_errors: Arc::new(RwLock::new(HashMap::new())),
            encode_delay: Arc::new(RwLock::new(Duration::ZERO)),
            segments_per_rendition: Arc::new(RwLock::new(3)),
            omit_segment_file: Arc::new(RwLock::new(false)),
            panic_on_probe: Arc::new(RwLock::new(false)),
        }
    }

    /// Get all recorded encodes.
    pub async fn recorded_encodes(&self) -> Vec<RecordedEncode> {
        self.encodes.read().await.clone()
    }

    /// Get the number of encodes performed.
    pub async fn encode_count(&self) -> usize {
        self.encodes.read().await.len()
    }

    /// Get the paths that were probed.
    pub async fn probed_paths(&self) -> Vec<PathBuf> {
        self.probes.read().await.clone()
    }

    /// Set the media info returned by every probe.
    pub async fn set_media_info(&self, info: MediaInfo) {
        *self.media_info.write().await = Some(info);
    }

    /// Configure the next probe to fail with the given error.
    pub async fn set_probe_error(&self, error: ToolchainError) {
        *self.probe_error.write().await = Some(error);
    }

    /// Configure the next encode of `rendition` to fail with the given error.
    pub async fn set_encode_error(&self, rendition: &str, error: ToolchainError) {
        self.encode_errors
            .write()
            .await
            .insert(rendition.to_string(), error);
    }

    /// Set the simulated duration of each encode.
    pub async fn set_encode_delay(&self, delay: Duration) {
        *self.encode_delay.write().await = delay;
    }

    /// Set how many segments each encode writes.
    pub async fn set_segments_per_rendition(&self, count: usize) {
        *self.segments_per_rendition.write().await = count.max(1);
    }

    /// List the last segment in the playlist without writing its file.
    pub async fn set_omit_segment_file(&self, omit: bool) {
        *self.omit_segment_file.write().await = omit;
    }

    /// Make the next probe panic instead of returning.
    pub async fn set_panic_on_probe(&self, panic: bool) {
        *self.panic_on_probe.write().await = panic;
    }

    /// A 1080p H.264/AAC source, one minute long.
    pub fn default_media_info(path: &Path) -> MediaInfo {
        MediaInfo {
            path: path.to_path_buf(),
            size_bytes: 10 * 1024 * 1024, // 10 MB
            duration_secs: 60.0,
            format: "mov".to_string(),
            video_codec: Some("h264".to_string()),
            video_width: Some(1920),
            video_height: Some(1080),
            video_fps: Some(30.0),
            audio_codec: Some("aac".to_string()),
            audio_channels: Some(2),
        }
    }

    async fn write_outputs(&self, job: &EncodeJob) -> std::io::Result<PathBuf> {
        let segments = *self.segments_per_rendition.read().await;
        let omit_last = *self.omit_segment_file.read().await;

        tokio::fs::create_dir_all(&job.output_dir).await?;

        let mut playlist = format!(
            "#EXTM3U\n#EXT-X-VERSION:3\n#EXT-X-TARGETDURATION:{}\n#EXT-X-MEDIA-SEQUENCE:0\n",
            job.segment_duration_secs
        );
        for i in 0..segments {
            let name = format!("segment_{:03}.ts", i);
            playlist.push_str(&format!("#EXTINF:{}.000000,\n{}\n", job.segment_duration_secs, name));
            if omit_last && i == segments - 1 {
                continue;
            }
            let body = format!("{}:{}:{}", job.rendition.name, i, job.input_path.display());
            tokio::fs::write(job.output_dir.join(&name), body).await?;
        }
        playlist.push_str("#EXT-X-ENDLIST\n");

        let playlist_path = job.output_dir.join(VARIANT_PLAYLIST);
        tokio::fs::write(&playlist_path, playlist).await?;
        Ok(playlist_path)
    }
}

#[async_trait]
impl Toolchain for MockToolchain {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, path: &Path) -> Result<MediaInfo, ToolchainError> {
        self.probes.write().await.push(path.to_path_buf());

        if std::mem::take(&mut *self.panic_on_probe.write().await) {
            panic!("mock toolchain probe panicked");
        }

        if let Some(err) = self.probe_error.write().await.take() {
            return Err(err);
        }

        if !path.exists() {
            return Err(ToolchainError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        if let Some(info) = self.media_info.read().await.as_ref() {
            let mut info = info.clone();
            info.path = path.to_path_buf();
            return Ok(info);
        }

        Ok(Self::default_media_info(path))
    }

    async fn encode(
        &self,
        job: EncodeJob,
        progress_tx: Option<mpsc::Sender<EncodeProgress>>,
    ) -> Result<EncodeOutput, ToolchainError> {
        let injected = self.encode_errors.write().await.remove(&job.rendition.name);
        if let Some(err) = injected {
            self.encodes.write().await.push(RecordedEncode {
                job,
                success: false,
            });
            return Err(err);
        }

        // Simulate encode time with progress updates
        let delay = *self.encode_delay.read().await;
        let steps = 4u32;
        for i in 1..=steps {
            if !delay.is_zero() {
                tokio::time::sleep(delay / steps).await;
            }
            if let Some(ref tx) = progress_tx {
                let fraction = i as f32 / steps as f32;
                let _ = tx
                    .send(EncodeProgress {
                        job_id: job.job_id.clone(),
                        rendition: job.rendition.name.clone(),
                        fraction,
                        time_secs: job.source_duration_secs.unwrap_or(0.0) * fraction as f64,
                        speed: Some("8x".to_string()),
                    })
                    .await;
            }
        }

        let playlist_path = self.write_outputs(&job).await?;

        self.encodes.write().await.push(RecordedEncode {
            job: job.clone(),
            success: true,
        });

        Ok(EncodeOutput {
            rendition: job.rendition.name,
            playlist_path,
            duration_ms: delay.as_millis() as u64,
        })
    }

    async fn validate(&self) -> Result<(), ToolchainError> {
        Ok(())
    }
}
