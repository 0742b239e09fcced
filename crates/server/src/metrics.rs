//! Prometheus metrics for the HTTP server.
//!
//! HTTP request and WebSocket metrics live here; the core crate contributes
//! store, listener and review metrics through `phonelist_core::metrics`.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use regex_lite::{Captures, Regex};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "phonelist_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("phonelist_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "phonelist_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Rejected credentials, by reason.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "phonelist_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// WebSocket Metrics
// =============================================================================

pub static WS_CONNECTIONS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "phonelist_ws_connections_active",
        "Number of active WebSocket connections",
    )
    .unwrap()
});

pub static WS_CONNECTIONS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "phonelist_ws_connections_total",
        "Total WebSocket connections since startup",
    )
    .unwrap()
});

/// WebSocket messages sent by type.
pub static WS_MESSAGES_SENT: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("phonelist_ws_messages_sent_total", "WebSocket messages sent"),
        &["type"],
    )
    .unwrap()
});

// =============================================================================
// Catalog Metrics (collected dynamically)
// =============================================================================

/// Items in the cached catalog.
pub static CATALOG_ITEMS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "phonelist_catalog_items",
        "Number of items in the cached catalog",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // WebSocket
    registry
        .register(Box::new(WS_CONNECTIONS_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_CONNECTIONS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(WS_MESSAGES_SENT.clone()))
        .unwrap();

    // Catalog
    registry.register(Box::new(CATALOG_ITEMS.clone())).unwrap();

    // Core metrics (store, listeners, reviews)
    for metric in phonelist_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh gauges from current application state before encoding.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    CATALOG_ITEMS.set(state.catalog().items().len() as i64);
}

static ID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"/(catalog|favorites|reviews)/([^/]+)").expect("id segment pattern is valid")
});

/// Normalize a path for metric labels (replace item and review ids with `{id}`).
pub fn normalize_path(path: &str) -> String {
    ID_SEGMENT
        .replace_all(path, |caps: &Captures| {
            if &caps[2] == "facets" {
                caps[0].to_string()
            } else {
                format!("/{}/{{id}}", &caps[1])
            }
        })
        .into_owned()
}
