//! In-memory progress tracker.

use chrono::{DateTime, TimeDelta, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::metrics;

use super::config::{ProgressConfig, MAX_RETENTION_SECS};
use super::types::{JobState, ProgressEntry, RunId, TranscodeStatus};

/// Highest percent a running job may report. 100 is reserved for `Done`.
const MAX_RUNNING_PERCENT: u8 = 99;

/// Retention as a `TimeDelta`, clamped to `MAX_RETENTION_SECS`.
fn retention_delta(secs: u64) -> TimeDelta {
    let secs = secs.min(MAX_RETENTION_SECS) as i64;
    TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX)
}

/// Process-wide map from video key to job state.
///
/// Cloning is cheap; all clones share the same entries.
#[derive(Clone)]
pub struct ProgressTracker {
    entries: Arc<RwLock<HashMap<String, ProgressEntry>>>,
    next_run: Arc<AtomicU64>,
    retention: TimeDelta,
}

impl ProgressTracker {
    pub fn new(config: &ProgressConfig) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            next_run: Arc::new(AtomicU64::new(1)),
            retention: retention_delta(config.retention_secs),
        }
    }

    /// Creates or resets the entry for `key` as pending and returns a fresh run id.
    pub async fn begin(&self, key: &str) -> RunId {
        let run_id = RunId(self.next_run.fetch_add(1, Ordering::Relaxed));
        let now = Utc::now();

        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            ProgressEntry {
                state: JobState::Pending,
                run_id,
                started_at: now,
                updated_at: now,
            },
        );
        metrics::PROGRESS_ENTRIES.set(entries.len() as i64);

        debug!(video_key = %key, %run_id, "Progress entry reset");
        run_id
    }

    /// Moves a pending entry to running at 0%.
    pub async fn mark_running(&self, key: &str, run_id: RunId) -> bool {
        self.update(key, run_id, |state| match state {
            JobState::Pending => Some(JobState::Running { percent: 0 }),
            _ => None,
        })
        .await
    }

    /// Raises the percent of an active run. Lower values are ignored.
    pub async fn advance(&self, key: &str, run_id: RunId, percent: u8) -> bool {
        let percent = percent.min(MAX_RUNNING_PERCENT);
        self.update(key, run_id, |state| match state {
            JobState::Pending => Some(JobState::Running { percent }),
            JobState::Running { percent: current } if percent > *current => {
                Some(JobState::Running { percent })
            }
            _ => None,
        })
        .await
    }

    /// Marks the run done (100%).
    pub async fn complete(&self, key: &str, run_id: RunId) -> bool {
        self.update(key, run_id, |state| match state {
            JobState::Pending | JobState::Running { .. } => Some(JobState::Done),
            _ => None,
        })
        .await
    }

    /// Marks the run failed, keeping the last reached percent.
    pub async fn fail(
        &self,
        key: &str,
        run_id: RunId,
        stage: impl Into<String>,
        reason: impl Into<String>,
    ) -> bool {
        let stage = stage.into();
        let reason = reason.into();
        self.update(key, run_id, move |state| match state {
            JobState::Pending | JobState::Running { .. } => Some(JobState::Failed {
                percent: state.percent(),
                stage: stage.clone(),
                reason: reason.clone(),
            }),
            _ => None,
        })
        .await
    }

    /// Applies a transition if `run_id` still owns the entry.
    async fn update<F>(&self, key: &str, run_id: RunId, transition: F) -> bool
    where
        F: Fn(&JobState) -> Option<JobState>,
    {
        let mut entries = self.entries.write().await;
        let Some(entry) = entries.get_mut(key) else {
            return false;
        };

        if entry.run_id != run_id {
            debug!(video_key = %key, %run_id, owner = %entry.run_id, "Ignoring update from superseded run");
            return false;
        }

        match transition(&entry.state) {
            Some(next) => {
                entry.state = next;
                entry.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Completion percent for `key`; unknown keys report 0.
    pub async fn get(&self, key: &str) -> u8 {
        self.state(key).await.percent()
    }

    /// State for `key`; unknown keys report `Pending`.
    pub async fn state(&self, key: &str) -> JobState {
        self.entries
            .read()
            .await
            .get(key)
            .map(|e| e.state.clone())
            .unwrap_or(JobState::Pending)
    }

    /// Status poll answer for `key`.
    pub async fn status(&self, key: &str) -> TranscodeStatus {
        TranscodeStatus::from(self.state(key).await)
    }

    pub async fn snapshot(&self, key: &str) -> Option<ProgressEntry> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Evicts terminal entries older than the retention period.
    pub async fn evict_expired(&self) -> usize {
        self.evict_expired_at(Utc::now()).await
    }

    /// Evicts terminal entries whose last update is at least one retention
    /// period before `now`. Pending and running entries are kept.
    pub async fn evict_expired_at(&self, now: DateTime<Utc>) -> usize {
        let Some(cutoff) = now.checked_sub_signed(self.retention) else {
            return 0;
        };
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !(entry.state.is_terminal() && entry.updated_at <= cutoff));
        let evicted = before - entries.len();

        metrics::PROGRESS_ENTRIES.set(entries.len() as i64);
        if evicted > 0 {
            metrics::PROGRESS_EVICTIONS.inc_by(evicted as u64);
            debug!(evicted, remaining = entries.len(), "Evicted expired progress entries");
        }
        evicted
    }

    /// Spawns a task that evicts expired entries every `interval` until shutdown.
    pub fn spawn_sweeper(
        &self,
        interval: Duration,
        mut shutdown_rx: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let tracker = self.clone();

        tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Progress sweeper started");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        info!("Progress sweeper received shutdown signal");
                        break;
                    }
                    _ = tokio::time::sleep(interval) => {
                        tracker.evict_expired().await;
                    }
                }
            }
            info!("Progress sweeper stopped");
        })
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new(&ProgressConfig::default())
    }
}
