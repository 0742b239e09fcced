//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Document store operations and live listeners
//! - Catalog fetches
//! - Review submissions

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Document store
// =============================================================================

/// Store operations total by operation and result.
pub static STORE_OPERATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "phonelist_store_operations_total",
            "Total document store operations",
        ),
        &["operation", "result"], // result: "ok", "error"
    )
    .unwrap()
});

/// Store operation duration in seconds.
pub static STORE_OPERATION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "phonelist_store_operation_duration_seconds",
            "Duration of document store operations",
        )
        .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        &["operation"],
    )
    .unwrap()
});

/// Snapshots delivered to live listeners.
pub static LISTENER_SNAPSHOTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "phonelist_listener_snapshots_total",
            "Total snapshots applied by live listeners",
        ),
        &["stream"], // "favorites", "reviews"
    )
    .unwrap()
});

/// Errors delivered to live listeners.
pub static LISTENER_ERRORS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "phonelist_listener_errors_total",
            "Total errors received by live listeners",
        ),
        &["stream"],
    )
    .unwrap()
});

// =============================================================================
// Catalog and reviews
// =============================================================================

/// Catalog fetches by result.
pub static CATALOG_FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("phonelist_catalog_fetches_total", "Total catalog fetches"),
        &["result"], // "ok", "error"
    )
    .unwrap()
});

/// Review submissions by kind.
pub static REVIEWS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "phonelist_reviews_submitted_total",
            "Total successful review submissions",
        ),
        &["kind"], // "created", "updated"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Record one store operation outcome and its duration.
pub(crate) fn record_store_operation<T, E>(
    operation: &str,
    started: std::time::Instant,
    result: &Result<T, E>,
) {
    let outcome = if result.is_ok() { "ok" } else { "error" };
    STORE_OPERATIONS
        .with_label_values(&[operation, outcome])
        .inc();
    STORE_OPERATION_DURATION
        .with_label_values(&[operation])
        .observe(started.elapsed().as_secs_f64());
}

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Store
        Box::new(STORE_OPERATIONS.clone()),
        Box::new(STORE_OPERATION_DURATION.clone()),
        Box::new(LISTENER_SNAPSHOTS.clone()),
        Box::new(LISTENER_ERRORS.clone()),
        // Catalog and reviews
        Box::new(CATALOG_FETCHES.clone()),
        Box::new(REVIEWS_SUBMITTED.clone()),
    ]
}
