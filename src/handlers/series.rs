//! Series window endpoint handler.

use axum::{
    extract::{Query, State},
    Json,
};
use jvm_metrics_feed::{LabelFilter, SeriesKey, SeriesPoint};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::state::SharedState;

/// Query parameters for the series endpoint.
#[derive(Deserialize, Debug)]
pub struct SeriesQuery {
    pub metric: String,
    /// `k=v,k2=v2` matchers; all series of the metric when absent.
    pub labels: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SeriesEntry {
    pub key: SeriesKey,
    pub points: Vec<SeriesPoint>,
}

/// Handler for the /series endpoint.
#[instrument(skip(state))]
pub async fn series_handler(
    State(state): State<SharedState>,
    Query(params): Query<SeriesQuery>,
) -> Json<Vec<SeriesEntry>> {
    debug!("Processing /series request for {}", params.metric);
    let filter = params
        .labels
        .as_deref()
        .map(LabelFilter::parse)
        .unwrap_or_default();

    let entries = state
        .scheduler
        .current()
        .series
        .series_for_metric(&params.metric)
        .into_iter()
        .filter(|(key, _)| filter.matches(key.labels()))
        .map(|(key, points)| SeriesEntry { key, points })
        .collect();

    Json(entries)
}
