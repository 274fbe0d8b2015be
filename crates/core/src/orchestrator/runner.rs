//! Transcode orchestrator implementation.
//!
//! Accepts start requests, checks them synchronously, and hands accepted
//! jobs to a bounded pool of background engine runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::auth::{require_admin, Identity};
use crate::metrics;
use crate::progress::{ProgressTracker, TranscodeStatus};
use crate::storage::validate_key;
use crate::transcode::{hls_key, normalize_video_key, TranscodeEngine};

use super::config::OrchestratorConfig;
use super::types::{OrchestratorError, PoolStatus, StartedTranscode};

/// Tracks statistics for the worker pool.
#[derive(Default)]
struct PoolStats {
    /// Accepted jobs not yet finished (queued + active).
    admitted: AtomicU64,
    active: AtomicU64,
    queued: AtomicU64,
    total_completed: AtomicU64,
    total_failed: AtomicU64,
}

impl PoolStats {
    fn to_status(&self, config: &OrchestratorConfig) -> PoolStatus {
        PoolStatus {
            active_jobs: self.active.load(Ordering::Relaxed) as usize,
            queued_jobs: self.queued.load(Ordering::Relaxed) as usize,
            max_concurrent: config.max_concurrent_jobs,
            max_queued: config.max_queued_jobs,
            total_completed: self.total_completed.load(Ordering::Relaxed),
            total_failed: self.total_failed.load(Ordering::Relaxed),
        }
    }
}

/// Entry point for starting transcodes and polling their status.
pub struct TranscodeOrchestrator {
    config: OrchestratorConfig,
    engine: Arc<TranscodeEngine>,
    semaphore: Arc<Semaphore>,
    stats: Arc<PoolStats>,
}

impl TranscodeOrchestrator {
    pub fn new(config: OrchestratorConfig, engine: TranscodeEngine) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));
        Self {
            config,
            engine: Arc::new(engine),
            semaphore,
            stats: Arc::new(PoolStats::default()),
        }
    }

    pub fn engine(&self) -> &TranscodeEngine {
        &self.engine
    }

    pub fn tracker(&self) -> &ProgressTracker {
        self.engine.tracker()
    }

    /// Starts a background transcode of `video_key` on behalf of `requester`.
    ///
    /// Returns as soon as the job is accepted; poll `status` for progress.
    pub async fn start_transcode(
        &self,
        video_key: &str,
        requester: &Identity,
    ) -> Result<StartedTranscode, OrchestratorError> {
        let result = self.admit(video_key, requester).await;
        if let Err(ref e) = result {
            metrics::JOBS_REJECTED.with_label_values(&[e.kind()]).inc();
            warn!(video_key, user_id = %requester.user_id, error = %e, "Transcode request rejected");
        }
        result
    }

    async fn admit(
        &self,
        raw_key: &str,
        requester: &Identity,
    ) -> Result<StartedTranscode, OrchestratorError> {
        require_admin(requester)?;

        let video_key = normalize_video_key(raw_key);
        if video_key.is_empty() {
            return Err(OrchestratorError::InvalidInput(
                "videoKey is required".to_string(),
            ));
        }
        validate_key(&video_key).map_err(|e| OrchestratorError::InvalidInput(e.to_string()))?;
        let hls_key = hls_key(&video_key).ok_or_else(|| {
            OrchestratorError::InvalidInput(format!("videoKey {:?} has no file name", video_key))
        })?;

        match self.engine.store().exists(&video_key).await {
            Ok(true) => {}
            Ok(false) => {
                return Err(OrchestratorError::ProcessingFailed {
                    details: format!("source video not found: {}", video_key),
                })
            }
            Err(e) => {
                return Err(OrchestratorError::ProcessingFailed {
                    details: e.to_string(),
                })
            }
        }

        self.reserve_slot()?;

        let run_id = self.tracker().begin(&video_key).await;
        self.stats.queued.fetch_add(1, Ordering::Relaxed);
        metrics::JOBS_STARTED.inc();
        info!(video_key = %video_key, %hls_key, %run_id, user_id = %requester.user_id, "Transcode job accepted");

        let engine = Arc::clone(&self.engine);
        let semaphore = Arc::clone(&self.semaphore);
        let stats = Arc::clone(&self.stats);
        let key = video_key.clone();

        tokio::spawn(async move {
            let permit = semaphore.acquire_owned().await;
            stats.queued.fetch_sub(1, Ordering::Relaxed);

            match permit {
                Ok(_permit) => {
                    stats.active.fetch_add(1, Ordering::Relaxed);
                    let run = {
                        let engine = Arc::clone(&engine);
                        let key = key.clone();
                        tokio::spawn(async move { engine.run(&key, run_id).await })
                    };
                    let joined = run.await;
                    stats.active.fetch_sub(1, Ordering::Relaxed);

                    match joined {
                        Ok(Ok(_)) => {
                            stats.total_completed.fetch_add(1, Ordering::Relaxed);
                        }
                        // The engine already logged and recorded the failure
                        Ok(Err(_)) => {
                            stats.total_failed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(e) => {
                            error!(video_key = %key, %run_id, error = %e, "Transcode task aborted");
                            engine
                                .tracker()
                                .fail(&key, run_id, "internal", "transcode task aborted")
                                .await;
                            metrics::JOBS_FINISHED.with_label_values(&["failed"]).inc();
                            stats.total_failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
                Err(_) => {
                    error!(video_key = %key, %run_id, "Worker pool closed before job could run");
                    engine
                        .tracker()
                        .fail(&key, run_id, "queue", "worker pool closed")
                        .await;
                    stats.total_failed.fetch_add(1, Ordering::Relaxed);
                }
            }

            stats.admitted.fetch_sub(1, Ordering::Relaxed);
        });

        Ok(StartedTranscode {
            video_key,
            hls_key,
            run_id,
        })
    }

    /// Claims a pool slot, failing when workers and queue are both full.
    fn reserve_slot(&self) -> Result<(), OrchestratorError> {
        let capacity = (self.config.max_concurrent_jobs.max(1) + self.config.max_queued_jobs) as u64;
        self.stats
            .admitted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n < capacity).then_some(n + 1)
            })
            .map(|_| ())
            .map_err(|_| OrchestratorError::QueueFull)
    }

    /// Progress of `video_key`; unknown keys report 0.
    pub async fn status(&self, video_key: &str) -> TranscodeStatus {
        self.tracker().status(&normalize_video_key(video_key)).await
    }

    pub fn pool_status(&self) -> PoolStatus {
        self.stats.to_status(&self.config)
    }
}
