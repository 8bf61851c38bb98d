//! Panel view endpoint handler.
//!
//! Every request projects the requested panel from the latest feed state.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jvm_metrics_feed::panels::{CpuPanel, GcPanel, HeapPanel, OverviewPanel};
use jvm_metrics_feed::{FeedState, Panel};
use tracing::{debug, instrument};

use crate::state::SharedState;

fn project<P: Panel>(panel: P, state: &FeedState) -> Response {
    Json(panel.project(state)).into_response()
}

/// Handler for the /panels/{name} endpoint.
#[instrument(skip(state))]
pub async fn panel_handler(State(state): State<SharedState>, Path(name): Path<String>) -> Response {
    debug!("Processing /panels/{} request", name);
    let current = state.scheduler.current();

    match name.as_str() {
        "overview" => project(OverviewPanel, &current),
        "gc" => project(GcPanel, &current),
        "heap" => project(HeapPanel, &current),
        "cpu" => project(CpuPanel, &current),
        other => (StatusCode::NOT_FOUND, format!("Unknown panel '{}'", other)).into_response(),
    }
}
