//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Ticket lifecycle (creations, rejections, closures, sweeps)
//! - Storage coordination (index mutations, creation lock)
//! - The chat platform gateway

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Lifecycle Metrics
// =============================================================================

/// Tickets successfully created.
pub static TICKETS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("ticketdesk_tickets_created_total", "Total tickets created").unwrap()
});

/// Creation requests turned down, by reason.
pub static CREATE_REJECTIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_create_rejections_total",
            "Ticket creation requests rejected",
        ),
        &["reason"], // "rate_limited", "already_creating", "lock_busy", "already_open", "name_collision", "failed"
    )
    .unwrap()
});

/// Tickets closed, by trigger.
pub static TICKETS_CLOSED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ticketdesk_tickets_closed_total", "Total tickets closed"),
        &["trigger"], // "manual", "inactivity"
    )
    .unwrap()
});

/// Time spent closing a ticket, history fetch included.
pub static CLOSE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "ticketdesk_close_duration_seconds",
            "Duration of ticket close and archive",
        )
        .buckets(vec![0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["trigger"],
    )
    .unwrap()
});

/// Inactivity sweep passes.
pub static SWEEP_RUNS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("ticketdesk_sweep_runs_total", "Inactivity sweep passes").unwrap()
});

// =============================================================================
// Storage Metrics
// =============================================================================

/// Index mutation jobs, by result.
pub static INDEX_MUTATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_index_mutations_total",
            "Index mutation jobs processed",
        ),
        &["result"], // "applied", "rejected", "failed"
    )
    .unwrap()
});

/// Creation lock outcomes.
pub static LOCK_ACQUISITIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_lock_acquisitions_total",
            "Creation lock acquisition outcomes",
        ),
        &["result"], // "acquired", "reclaimed", "busy"
    )
    .unwrap()
});

// =============================================================================
// Gateway Metrics
// =============================================================================

/// Gateway calls by operation and result.
pub static GATEWAY_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "ticketdesk_gateway_requests_total",
            "Chat platform requests",
        ),
        &["operation", "result"], // result: "success", "failure"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Lifecycle
        Box::new(TICKETS_CREATED.clone()),
        Box::new(CREATE_REJECTIONS.clone()),
        Box::new(TICKETS_CLOSED.clone()),
        Box::new(CLOSE_DURATION.clone()),
        Box::new(SWEEP_RUNS.clone()),
        // Storage
        Box::new(INDEX_MUTATIONS.clone()),
        Box::new(LOCK_ACQUISITIONS.clone()),
        // Gateway
        Box::new(GATEWAY_REQUESTS.clone()),
    ]
}
