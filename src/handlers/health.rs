//! Health check endpoint handler.
//!
//! This module provides the `/health` endpoint handler that reports
//! scheduler state and the latest fetch outcome as plain text.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use jvm_metrics_feed::SchedulerState;
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Handler for the /health endpoint.
#[instrument(skip(state))]
pub async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing /health request");

    let scheduler_state = state.scheduler.state();
    let summary = state.scheduler.current().summary();

    let (status, message) = match (&scheduler_state, &summary.error) {
        (SchedulerState::Stopped, _) => (StatusCode::SERVICE_UNAVAILABLE, "Stopped"),
        (SchedulerState::Polling(_), Some(_)) => (StatusCode::OK, "OK - Last fetch failed"),
        _ => (StatusCode::OK, "OK"),
    };

    let mut out = String::new();
    writeln!(out, "{message}\n").ok();
    writeln!(out, "Uptime:        {}", state.uptime()).ok();
    match &summary.target {
        Some(target) => writeln!(out, "Target:        {}", target).ok(),
        None => writeln!(out, "Target:        none").ok(),
    };
    writeln!(out, "Loading:       {}", summary.loading).ok();
    writeln!(out, "Metrics:       {}", summary.metric_count).ok();
    writeln!(out, "Samples:       {}", summary.sample_count).ok();
    writeln!(out, "Series:        {}", summary.series_count).ok();
    if let Some(error) = &summary.error {
        writeln!(out, "Last error:    {}", error).ok();
    }

    debug!("Health check: {} - {}", status, message);
    (status, [("Content-Type", "text/plain; charset=utf-8")], out)
}
