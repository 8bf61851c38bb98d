//! Feed summary endpoint handler.

use axum::{extract::State, Json};
use jvm_metrics_feed::{FeedSummary, SchedulerState};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::state::SharedState;

#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub scheduler: SchedulerState,
    #[serde(flatten)]
    pub summary: FeedSummary,
    pub metric_names: Vec<String>,
}

/// Handler for the /feed endpoint.
#[instrument(skip(state))]
pub async fn feed_handler(State(state): State<SharedState>) -> Json<FeedResponse> {
    debug!("Processing /feed request");
    let current = state.scheduler.current();
    let metric_names = current
        .snapshot
        .as_ref()
        .map(|s| s.metric_names().map(str::to_string).collect())
        .unwrap_or_default();

    Json(FeedResponse {
        scheduler: state.scheduler.state(),
        summary: current.summary(),
        metric_names,
    })
}
