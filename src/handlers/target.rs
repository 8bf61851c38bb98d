//! Target selection endpoint handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jvm_metrics_feed::{SchedulerError, TargetId};
use tracing::{info, instrument, warn};

use crate::state::SharedState;

fn respond(state: &SharedState, result: Result<(), SchedulerError>) -> Response {
    match result {
        Ok(()) => Json(state.scheduler.state()).into_response(),
        Err(e) => {
            warn!("Target change rejected: {}", e);
            (StatusCode::CONFLICT, e.to_string()).into_response()
        }
    }
}

/// Handler for PUT /target/{id}.
#[instrument(skip(state))]
pub async fn select_target_handler(
    State(state): State<SharedState>,
    Path(id): Path<String>,
) -> Response {
    info!("Selecting target {}", id);
    let result = state.scheduler.select(TargetId::new(id));
    respond(&state, result)
}

/// Handler for DELETE /target.
#[instrument(skip(state))]
pub async fn clear_target_handler(State(state): State<SharedState>) -> Response {
    info!("Clearing target");
    let result = state.scheduler.clear();
    respond(&state, result)
}
