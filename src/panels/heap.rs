//! Heap panel: heap usage per area over time plus heap totals.

use serde::Serialize;

use super::{chart_lines, ChartLine, Panel};
use crate::feed::FeedState;
use crate::feed_config::FeedConfig;
use crate::format::format_bytes;
use crate::ingest::SeriesSpec;
use crate::projections::{label_equals, sum_metric_where, LabelFilter};
use crate::snapshot::MetricMap;

pub const MEMORY_USED: &str = "jvm_memory_bytes_used";
pub const MEMORY_COMMITTED: &str = "jvm_memory_bytes_committed";
pub const MEMORY_MAX: &str = "jvm_memory_bytes_max";

const HEAP_AREA: &str = "heap";
const LINE_LABELS: &[&str] = &["id", "pool", "area"];

/// Heap totals summed over samples with `area="heap"`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeapSummary {
    pub used: Option<f64>,
    pub committed: Option<f64>,
    pub max: Option<f64>,
    pub used_display: String,
    pub committed_display: String,
    pub max_display: String,
}

impl HeapSummary {
    pub fn from_metrics(metrics: &MetricMap) -> Self {
        let sum = |name: &str| {
            metrics
                .contains_key(name)
                .then(|| sum_metric_where(metrics, name, label_equals("area", HEAP_AREA)))
        };
        let used = sum(MEMORY_USED);
        let committed = sum(MEMORY_COMMITTED);
        let max = sum(MEMORY_MAX);
        Self {
            used,
            committed,
            max,
            used_display: format_bytes(used),
            committed_display: format_bytes(committed),
            max_display: format_bytes(max),
        }
    }

    fn empty() -> Self {
        Self {
            used: None,
            committed: None,
            max: None,
            used_display: format_bytes(None),
            committed_display: format_bytes(None),
            max_display: format_bytes(None),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HeapView {
    pub lines: Vec<ChartLine>,
    pub summary: HeapSummary,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct HeapPanel;

impl Panel for HeapPanel {
    type View = HeapView;

    fn name(&self) -> &'static str {
        "heap"
    }

    fn series(&self, config: &FeedConfig) -> Vec<SeriesSpec> {
        vec![SeriesSpec::gauge(MEMORY_USED)
            .with_filter(LabelFilter::any().with("area", HEAP_AREA))
            .with_capacity(config.pool_history_points)]
    }

    fn project(&self, state: &FeedState) -> HeapView {
        HeapView {
            lines: chart_lines(&state.series, MEMORY_USED, LINE_LABELS, HEAP_AREA),
            summary: state
                .snapshot
                .as_ref()
                .map(|s| HeapSummary::from_metrics(&s.metrics))
                .unwrap_or_else(HeapSummary::empty),
        }
    }
}
