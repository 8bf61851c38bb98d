//! Dashboard consumers of the feed.
//!
//! Each panel declares the series it needs recorded and projects its own
//! view from a [`FeedState`]. Panels never write to the feed; views are
//! recomputed from the latest snapshot on every call.
//!
//! - `overview`: threads, process CPU seconds, resident memory
//! - `gc`: per-collector time and collection rate
//! - `heap`: per-area heap usage and heap totals
//! - `cpu`: CPU seconds rate and utilization

pub mod cpu;
pub mod gc;
pub mod heap;
pub mod overview;

use serde::Serialize;

use crate::feed::FeedState;
use crate::feed_config::FeedConfig;
use crate::ingest::SeriesSpec;
use crate::projections::display_label;
use crate::ringbuffer::SeriesPoint;
use crate::series_store::SeriesView;
use crate::snapshot::SeriesKey;

pub use cpu::{CpuPanel, CpuView};
pub use gc::{CollectorTotal, GcPanel, GcView};
pub use heap::{HeapPanel, HeapSummary, HeapView};
pub use overview::{OverviewPanel, OverviewView};

/// A consumer of the feed.
pub trait Panel {
    type View: Serialize;

    fn name(&self) -> &'static str;

    /// Series this panel needs recorded into rolling windows.
    fn series(&self, config: &FeedConfig) -> Vec<SeriesSpec>;

    /// Derives the panel's view from the current feed state.
    fn project(&self, state: &FeedState) -> Self::View;
}

/// One labeled line of a chart.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChartLine {
    pub label: String,
    pub key: SeriesKey,
    pub points: Vec<SeriesPoint>,
}

/// Builds one chart line per label combination of `metric`.
pub(crate) fn chart_lines(
    view: &SeriesView,
    metric: &str,
    label_keys: &[&str],
    fallback: &str,
) -> Vec<ChartLine> {
    view.series_for_metric(metric)
        .into_iter()
        .map(|(key, points)| ChartLine {
            label: display_label(key.labels(), label_keys, fallback),
            key,
            points,
        })
        .collect()
}

/// Returns the window of the unlabeled series of `metric`, or empty.
pub(crate) fn plain_window(view: &SeriesView, metric: &str) -> Vec<SeriesPoint> {
    view.window(&SeriesKey::new(metric, Default::default()))
        .unwrap_or_default()
}

/// Series needed by all built-in panels.
pub fn default_series_specs(config: &FeedConfig) -> Vec<SeriesSpec> {
    let mut specs = OverviewPanel.series(config);
    specs.extend(GcPanel.series(config));
    specs.extend(HeapPanel.series(config));
    specs.extend(CpuPanel.series(config));
    specs
}
