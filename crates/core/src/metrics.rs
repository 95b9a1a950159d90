//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Acquisition attempts and their duration
//! - Speculative artist rollbacks on the catalog backend
//! - Backend HTTP requests
//! - Queue items observed leaving a backend queue

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Acquisition Metrics
// =============================================================================

/// Acquisition attempts total by backend and result.
pub static ACQUISITION_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "encore_acquisition_attempts_total",
            "Total album acquisition attempts",
        ),
        &["backend", "result"], // "success", "failed"
    )
    .unwrap()
});

/// Acquisition duration in seconds.
pub static ACQUISITION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "encore_acquisition_duration_seconds",
            "Duration of a single download_album call",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &["backend", "result"],
    )
    .unwrap()
});

/// Artists deleted again after a failed album match.
pub static ARTIST_ROLLBACKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "encore_artist_rollbacks_total",
            "Speculatively created artists removed after a failed match",
        ),
        &["result"], // "deleted", "failed"
    )
    .unwrap()
});

// =============================================================================
// Backend Metrics
// =============================================================================

/// Backend HTTP requests by backend and outcome.
pub static BACKEND_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("encore_backend_requests_total", "Backend HTTP requests"),
        &["backend", "outcome"], // "ok", "http_error", "error"
    )
    .unwrap()
});

// =============================================================================
// Queue Metrics
// =============================================================================

/// Queue entries that disappeared between two snapshots.
pub static QUEUE_ITEMS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "encore_queue_items_finished_total",
            "Queue entries present in a previous snapshot but absent from the next",
        ),
        &["backend"],
    )
    .unwrap()
});

/// Queue snapshots that failed to load.
pub static QUEUE_POLL_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "encore_queue_poll_failures_total",
        "Queue snapshot fetches that failed",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(ACQUISITION_ATTEMPTS.clone()),
        Box::new(ACQUISITION_DURATION.clone()),
        Box::new(ARTIST_ROLLBACKS.clone()),
        Box::new(BACKEND_REQUESTS.clone()),
        Box::new(QUEUE_ITEMS_FINISHED.clone()),
        Box::new(QUEUE_POLL_FAILURES.clone()),
    ]
}
