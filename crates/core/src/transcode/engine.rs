//! Transcode engine: runs the HLS pipeline for one source video.

use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::metrics;
use crate::progress::{ProgressTracker, RunId};
use crate::storage::ObjectStore;

use super::config::TranscodeConfig;
use super::error::{EngineCause, EngineError};
use super::keys::{self, MASTER_PLAYLIST, VARIANT_PLAYLIST};
use super::manifest::{content_type_for, parse_variant_playlist, render_master_playlist};
use super::schedule::StageSchedule;
use super::traits::Toolchain;
use super::types::{EncodeJob, EncodeOutput, MediaInfo, Rendition, Stage, TranscodeOutcome};

/// Capacity of the per-encode progress channel.
const PROGRESS_CHANNEL_CAPACITY: usize = 16;

/// Picks the renditions to produce for a source of the given height.
///
/// Renditions taller than the source are dropped, but the lowest one is
/// always kept. An unknown height keeps the whole ladder.
pub fn select_renditions(ladder: &[Rendition], source_height: Option<u32>) -> Vec<Rendition> {
    let Some(height) = source_height else {
        return ladder.to_vec();
    };

    let selected: Vec<Rendition> = ladder.iter().filter(|r| r.height <= height).cloned().collect();
    if !selected.is_empty() {
        return selected;
    }

    ladder
        .iter()
        .min_by_key(|r| r.height)
        .cloned()
        .into_iter()
        .collect()
}

/// A local output file and where it goes in the store.
#[derive(Debug, Clone)]
struct UploadItem {
    key: String,
    path: PathBuf,
    content_type: &'static str,
}

/// Per-run state shared by the stages.
struct RunContext<'a> {
    video_key: &'a str,
    run_id: RunId,
    scratch: &'a Path,
    hls_prefix: String,
}

/// Runs the fetch, probe, encode, manifest and upload stages for a video key.
pub struct TranscodeEngine {
    config: TranscodeConfig,
    store: Arc<dyn ObjectStore>,
    toolchain: Arc<dyn Toolchain>,
    tracker: ProgressTracker,
}

impl TranscodeEngine {
    pub fn new(
        config: TranscodeConfig,
        store: Arc<dyn ObjectStore>,
        toolchain: Arc<dyn Toolchain>,
        tracker: ProgressTracker,
    ) -> Self {
        Self {
            config,
            store,
            toolchain,
            tracker,
        }
    }

    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn tracker(&self) -> &ProgressTracker {
        &self.tracker
    }

    /// Transcodes `video_key` into an HLS package under `hls/<name>/`.
    ///
    /// Progress and the final state are written to the tracker under
    /// `run_id`; failures are also returned to the caller.
    pub async fn run(&self, video_key: &str, run_id: RunId) -> Result<TranscodeOutcome, EngineError> {
        let start = Instant::now();
        self.tracker.mark_running(video_key, run_id).await;
        info!(video_key, %run_id, "Transcode started");

        let scratch = self.config.temp_dir.join(Uuid::new_v4().to_string());
        let result = self.run_stages(video_key, run_id, &scratch).await;

        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            if e.kind() != ErrorKind::NotFound {
                warn!(video_key, path = %scratch.display(), error = %e, "Failed to remove scratch directory");
            }
        }

        let elapsed = start.elapsed();
        match result {
            Ok(mut outcome) => {
                outcome.duration_ms = elapsed.as_millis() as u64;

                let owned = self.tracker.complete(video_key, run_id).await;
                // A newer run of the same key may still need the source
                if self.config.delete_source && owned {
                    self.delete_source(video_key).await;
                }
                metrics::JOBS_FINISHED.with_label_values(&["done"]).inc();
                metrics::TRANSCODE_DURATION
                    .with_label_values(&["done"])
                    .observe(elapsed.as_secs_f64());

                info!(
                    video_key,
                    %run_id,
                    hls_key = %outcome.hls_key,
                    renditions = ?outcome.renditions,
                    files = outcome.files_written,
                    bytes = outcome.bytes_written,
                    duration_ms = outcome.duration_ms,
                    "Transcode finished"
                );
                Ok(outcome)
            }
            Err(e) => {
                self.tracker
                    .fail(video_key, run_id, e.stage.to_string(), e.cause.to_string())
                    .await;
                metrics::JOBS_FINISHED.with_label_values(&["failed"]).inc();
                metrics::TRANSCODE_DURATION
                    .with_label_values(&["failed"])
                    .observe(elapsed.as_secs_f64());

                error!(
                    video_key,
                    %run_id,
                    stage = %e.stage,
                    error = %e.cause,
                    retryable = e.is_retryable(),
                    "Transcode failed"
                );
                Err(e)
            }
        }
    }

    async fn run_stages(
        &self,
        video_key: &str,
        run_id: RunId,
        scratch: &Path,
    ) -> Result<TranscodeOutcome, EngineError> {
        let hls_prefix = keys::hls_prefix(video_key).ok_or_else(|| {
            EngineError::new(
                Stage::Fetch,
                EngineCause::UnsupportedSource {
                    reason: format!("video key {:?} has no file name", video_key),
                },
            )
        })?;
        let ctx = RunContext {
            video_key,
            run_id,
            scratch,
            hls_prefix,
        };

        // Planned against the full ladder until the probe narrows it
        let mut schedule = StageSchedule::new(self.config.renditions.len());

        let input = self.stage(Stage::Fetch, self.fetch(&ctx)).await?;
        self.report(&ctx, schedule.completed(1)).await;

        let (info, renditions) = self.stage(Stage::Probe, self.probe(&input)).await?;
        schedule = StageSchedule::new(renditions.len());
        self.report(&ctx, schedule.completed(2)).await;

        for (i, rendition) in renditions.iter().enumerate() {
            let stage_no = schedule.first_encode() + i as u32;
            let stage = Stage::Encode {
                rendition: rendition.name.clone(),
            };
            self.stage(
                stage,
                self.encode(&ctx, schedule, stage_no, &input, &info, rendition),
            )
            .await?;
            self.report(&ctx, schedule.completed(stage_no)).await;
        }

        let (files, master) = self
            .stage(Stage::Manifest, self.build_manifest(&ctx, &renditions, &info))
            .await?;
        self.report(&ctx, schedule.completed(schedule.manifest())).await;

        let (files_written, bytes_written) = self
            .stage(Stage::Upload, self.upload(&ctx, schedule, files, master))
            .await?;

        Ok(TranscodeOutcome {
            video_key: video_key.to_string(),
            hls_key: format!("{}/{}", ctx.hls_prefix, MASTER_PLAYLIST),
            renditions: renditions.into_iter().map(|r| r.name).collect(),
            files_written,
            bytes_written,
            duration_ms: 0,
        })
    }

    /// Runs one stage, timing it and tagging any failure with the stage.
    async fn stage<T, F>(&self, stage: Stage, fut: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, EngineCause>>,
    {
        let started = Instant::now();
        let result = fut.await;
        metrics::STAGE_DURATION
            .with_label_values(&[stage.kind()])
            .observe(started.elapsed().as_secs_f64());

        match result {
            Ok(value) => {
                debug!(%stage, elapsed_ms = started.elapsed().as_millis() as u64, "Stage finished");
                Ok(value)
            }
            Err(cause) => {
                let err = EngineError::new(stage, cause);
                let retryable = if err.is_retryable() { "true" } else { "false" };
                metrics::STAGE_FAILURES
                    .with_label_values(&[err.stage.kind(), retryable])
                    .inc();
                Err(err)
            }
        }
    }

    async fn report(&self, ctx: &RunContext<'_>, percent: u8) {
        self.tracker.advance(ctx.video_key, ctx.run_id, percent).await;
    }

    /// Downloads the source into the scratch directory.
    async fn fetch(&self, ctx: &RunContext<'_>) -> Result<PathBuf, EngineCause> {
        let data = self.store.fetch(ctx.video_key).await?;

        tokio::fs::create_dir_all(ctx.scratch).await?;
        let ext = keys::extension(ctx.video_key).unwrap_or("bin");
        let input = ctx.scratch.join(format!("input.{}", ext));
        tokio::fs::write(&input, &data).await?;

        debug!(video_key = ctx.video_key, bytes = data.len(), path = %input.display(), "Fetched source");
        Ok(input)
    }

    async fn probe(&self, input: &Path) -> Result<(MediaInfo, Vec<Rendition>), EngineCause> {
        let info = self.toolchain.probe(input).await?;
        if !info.has_video() {
            return Err(EngineCause::UnsupportedSource {
                reason: "source has no video stream".to_string(),
            });
        }

        let renditions = select_renditions(&self.config.renditions, info.video_height);
        debug!(
            width = ?info.video_width,
            height = ?info.video_height,
            duration_secs = info.duration_secs,
            renditions = ?renditions.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
            "Probed source"
        );
        Ok((info, renditions))
    }

    /// Encodes one rendition, forwarding toolchain progress to the tracker.
    async fn encode(
        &self,
        ctx: &RunContext<'_>,
        schedule: StageSchedule,
        stage_no: u32,
        input: &Path,
        info: &MediaInfo,
        rendition: &Rendition,
    ) -> Result<EncodeOutput, EngineCause> {
        let job = EncodeJob {
            job_id: ctx.run_id.to_string(),
            input_path: input.to_path_buf(),
            output_dir: ctx.scratch.join("hls").join(&rendition.name),
            rendition: rendition.clone(),
            segment_duration_secs: self.config.segment_duration_secs,
            source_duration_secs: (info.duration_secs > 0.0).then_some(info.duration_secs),
            include_audio: info.has_audio(),
        };

        let (tx, mut rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        let encode = self.toolchain.encode(job, Some(tx));
        let forward = async {
            // Ends once the toolchain drops its sender
            while let Some(progress) = rx.recv().await {
                self.report(ctx, schedule.within(stage_no, progress.fraction))
                    .await;
            }
        };

        let (result, ()) = tokio::join!(encode, forward);
        let output = result?;
        debug!(rendition = %rendition.name, duration_ms = output.duration_ms, "Encoded rendition");
        Ok(output)
    }

    /// Verifies the variant playlists and writes the master playlist.
    ///
    /// Returns the variant files to upload and, separately, the master.
    async fn build_manifest(
        &self,
        ctx: &RunContext<'_>,
        renditions: &[Rendition],
        info: &MediaInfo,
    ) -> Result<(Vec<UploadItem>, UploadItem), EngineCause> {
        let hls_dir = ctx.scratch.join("hls");
        let mut files = Vec::new();

        for rendition in renditions {
            let dir = hls_dir.join(&rendition.name);
            let playlist_path = dir.join(VARIANT_PLAYLIST);
            let text = tokio::fs::read_to_string(&playlist_path).await?;
            let playlist = parse_variant_playlist(&text).map_err(|reason| EngineCause::Playlist {
                reason: format!("{}: {}", rendition.name, reason),
            })?;

            for segment in &playlist.segments {
                if segment.contains('/') || segment.contains('\\') || segment.starts_with('.') {
                    return Err(EngineCause::Playlist {
                        reason: format!("{}: unexpected segment uri {}", rendition.name, segment),
                    });
                }
                let path = dir.join(segment);
                if !tokio::fs::try_exists(&path).await? {
                    return Err(EngineCause::Playlist {
                        reason: format!("{}: missing segment {}", rendition.name, segment),
                    });
                }
                files.push(UploadItem {
                    key: format!("{}/{}/{}", ctx.hls_prefix, rendition.name, segment),
                    path,
                    content_type: content_type_for(segment),
                });
            }

            files.push(UploadItem {
                key: format!("{}/{}/{}", ctx.hls_prefix, rendition.name, VARIANT_PLAYLIST),
                path: playlist_path,
                content_type: content_type_for(VARIANT_PLAYLIST),
            });
        }

        let master_path = hls_dir.join(MASTER_PLAYLIST);
        let master_text = render_master_playlist(renditions, info.dimensions(), info.has_audio());
        tokio::fs::write(&master_path, master_text).await?;

        let master = UploadItem {
            key: format!("{}/{}", ctx.hls_prefix, MASTER_PLAYLIST),
            path: master_path,
            content_type: content_type_for(MASTER_PLAYLIST),
        };
        Ok((files, master))
    }

    /// Uploads variant files concurrently, then the master playlist.
    async fn upload(
        &self,
        ctx: &RunContext<'_>,
        schedule: StageSchedule,
        files: Vec<UploadItem>,
        master: UploadItem,
    ) -> Result<(usize, u64), EngineCause> {
        let total = files.len() + 1;
        let mut uploaded = 0usize;
        let mut bytes = 0u64;

        let mut uploads = stream::iter(files)
            .map(|item| self.put_file(item))
            .buffer_unordered(self.config.upload_concurrency.max(1));

        while let Some(result) = uploads.next().await {
            bytes += result?;
            uploaded += 1;
            self.report(
                ctx,
                schedule.within(schedule.upload(), uploaded as f32 / total as f32),
            )
            .await;
        }

        // Master goes last so a visible master never points at missing files
        bytes += self.put_file(master).await?;
        Ok((uploaded + 1, bytes))
    }

    async fn put_file(&self, item: UploadItem) -> Result<u64, EngineCause> {
        let data = Bytes::from(tokio::fs::read(&item.path).await?);
        let size = data.len() as u64;
        self.store.put(&item.key, data, item.content_type).await?;
        metrics::BYTES_UPLOADED.inc_by(size);
        Ok(size)
    }

    async fn delete_source(&self, video_key: &str) {
        match self.store.delete(video_key).await {
            Ok(()) => info!(video_key, "Deleted source after transcode"),
            Err(e) => warn!(video_key, error = %e, "Failed to delete source after transcode"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ladder() -> Vec<Rendition> {
        vec![
            Rendition::new("720p", 1280, 720, 2800, 128),
            Rendition::new("480p", 854, 480, 1400, 128),
            Rendition::new("360p", 640, 360, 800, 96),
        ]
    }

    fn names(renditions: &[Rendition]) -> Vec<&str> {
        renditions.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn test_select_renditions_full_hd_source() {
        let selected = select_renditions(&ladder(), Some(1080));
        assert_eq!(names(&selected), vec!["720p", "480p", "360p"]);
    }

    #[test]
    fn test_select_renditions_skips_upscales() {
        let selected = select_renditions(&ladder(), Some(480));
        assert_eq!(names(&selected), vec!["480p", "360p"]);
    }

    #[test]
    fn test_select_renditions_keeps_lowest_for_tiny_source() {
        let selected = select_renditions(&ladder(), Some(240));
        assert_eq!(names(&selected), vec!["360p"]);
    }

    #[test]
    fn test_select_renditions_unknown_height() {
        let selected = select_renditions(&ladder(), None);
        assert_eq!(selected.len(), 3);
    }
}
