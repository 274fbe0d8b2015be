//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Orchestrator (admission, rejections)
//! - Transcode engine (runs, stages, uploads)
//! - Progress tracker (entries, evictions)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Jobs accepted into the worker pool.
pub static JOBS_STARTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "hlsmith_transcode_jobs_started_total",
        "Total transcode jobs accepted",
    )
    .unwrap()
});

/// Start requests refused before dispatch.
pub static JOBS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hlsmith_transcode_jobs_rejected_total",
            "Start requests refused before dispatch",
        ),
        &["reason"], // "invalid_input", "unauthorized", "processing_failed", "queue_full"
    )
    .unwrap()
});

// =============================================================================
// Engine Metrics
// =============================================================================

/// Finished runs by outcome.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hlsmith_transcode_jobs_finished_total",
            "Total transcode runs finished",
        ),
        &["outcome"], // "done", "failed"
    )
    .unwrap()
});

/// Run duration in seconds.
pub static TRANSCODE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "hlsmith_transcode_duration_seconds",
            "Duration of a full transcode run",
        )
        .buckets(vec![
            5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1200.0, 1800.0, 3600.0,
        ]),
        &["outcome"],
    )
    .unwrap()
});

/// Stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "hlsmith_stage_duration_seconds",
            "Duration of a single pipeline stage",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0]),
        &["stage"],
    )
    .unwrap()
});

/// Stage failures by stage and whether a rerun could succeed.
pub static STAGE_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "hlsmith_stage_failures_total",
            "Pipeline stage failures",
        ),
        &["stage", "retryable"],
    )
    .unwrap()
});

/// Bytes written to the object store.
pub static BYTES_UPLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "hlsmith_bytes_uploaded_total",
        "Total bytes of HLS output written to the object store",
    )
    .unwrap()
});

// =============================================================================
// Progress Tracker Metrics
// =============================================================================

/// Entries currently held by the tracker.
pub static PROGRESS_ENTRIES: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "hlsmith_progress_entries",
        "Number of jobs held by the progress tracker",
    )
    .unwrap()
});

/// Entries removed by retention.
pub static PROGRESS_EVICTIONS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "hlsmith_progress_evictions_total",
        "Terminal progress entries evicted after retention",
    )
    .unwrap()
});

/// Returns every core metric for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Orchestrator
        Box::new(JOBS_STARTED.clone()),
        Box::new(JOBS_REJECTED.clone()),
        // Engine
        Box::new(JOBS_FINISHED.clone()),
        Box::new(TRANSCODE_DURATION.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(STAGE_FAILURES.clone()),
        Box::new(BYTES_UPLOADED.clone()),
        // Progress
        Box::new(PROGRESS_ENTRIES.clone()),
        Box::new(PROGRESS_EVICTIONS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
        JOBS_FINISHED.with_label_values(&["done"]).inc();
        let families = registry.gather();
        assert!(families
            .iter()
            .any(|f| f.get_name() == "hlsmith_transcode_jobs_finished_total"));
    }
}
