//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the ticketdesk server:
//! - HTTP request metrics (latency, counts)
//! - Open tickets and rate-limited users (collected dynamically)
//! - Everything the core registers (lifecycle, storage, gateway)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;

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
            "ticketdesk_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ticketdesk_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketdesk_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Ticket Metrics (collected dynamically)
// =============================================================================

/// Tickets currently open.
pub static OPEN_TICKETS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("ticketdesk_open_tickets", "Tickets currently open").unwrap()
});

/// Users currently inside their creation cooldown.
pub static RATE_LIMITED_USERS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "ticketdesk_rate_limited_users",
        "Users with a recorded ticket creation inside the cooldown",
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

    // Tickets
    registry.register(Box::new(OPEN_TICKETS.clone())).unwrap();
    registry
        .register(Box::new(RATE_LIMITED_USERS.clone()))
        .unwrap();

    // Core metrics (lifecycle, storage, gateway)
    for metric in ticketdesk_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the index at scrape time.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Ok(tickets) = state.manager().tickets().await {
        OPEN_TICKETS.set(tickets.len() as i64);
    }
    RATE_LIMITED_USERS.set(state.manager().rate_limiter().len().await as i64);
}

static SNOWFLAKE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace ids with placeholders).
pub fn normalize_path(path: &str) -> String {
    // applied twice: adjacent ids share the separating slash
    let once = SNOWFLAKE.replace_all(path, "/{id}$1");
    SNOWFLAKE.replace_all(&once, "/{id}$1").into_owned()
}
