//! GC panel: collection time per collector and collection rate.

use serde::Serialize;

use super::{chart_lines, ChartLine, Panel};
use crate::feed::FeedState;
use crate::feed_config::FeedConfig;
use crate::ingest::SeriesSpec;
use crate::projections::{display_label, first_metric_value_where};
use crate::snapshot::Snapshot;

pub const GC_SECONDS_SUM: &str = "jvm_gc_collection_seconds_sum";
pub const GC_SECONDS_COUNT: &str = "jvm_gc_collection_seconds_count";

const COLLECTOR_LABELS: &[&str] = &["gc", "name"];

/// Totals of one collector as of the latest snapshot.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CollectorTotal {
    pub collector: String,
    pub time_seconds: f64,
    pub count: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GcView {
    /// Cumulative collection seconds, one line per collector.
    pub time_lines: Vec<ChartLine>,
    /// Collections per poll interval, one line per collector.
    pub rate_lines: Vec<ChartLine>,
    pub collectors: Vec<CollectorTotal>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GcPanel;

impl GcPanel {
    /// Joins `_sum` and `_count` samples on the `gc` label.
    pub fn collector_totals(snapshot: &Snapshot) -> Vec<CollectorTotal> {
        snapshot
            .samples(GC_SECONDS_SUM)
            .iter()
            .map(|sum| {
                let gc = sum.label("gc");
                let count = first_metric_value_where(&snapshot.metrics, GC_SECONDS_COUNT, |labels| {
                    labels.get("gc").map(String::as_str) == gc
                });
                CollectorTotal {
                    collector: display_label(&sum.labels, COLLECTOR_LABELS, "gc"),
                    time_seconds: sum.value,
                    count,
                }
            })
            .collect()
    }
}

impl Panel for GcPanel {
    type View = GcView;

    fn name(&self) -> &'static str {
        "gc"
    }

    fn series(&self, config: &FeedConfig) -> Vec<SeriesSpec> {
        vec![
            SeriesSpec::gauge(GC_SECONDS_SUM).with_capacity(config.pool_history_points),
            SeriesSpec::counter(GC_SECONDS_COUNT).with_capacity(config.pool_history_points),
        ]
    }

    fn project(&self, state: &FeedState) -> GcView {
        GcView {
            time_lines: chart_lines(&state.series, GC_SECONDS_SUM, COLLECTOR_LABELS, "gc"),
            rate_lines: chart_lines(&state.series, GC_SECONDS_COUNT, COLLECTOR_LABELS, "gc"),
            collectors: state
                .snapshot
                .as_deref()
                .map(Self::collector_totals)
                .unwrap_or_default(),
        }
    }
}
