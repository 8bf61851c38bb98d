//! CPU panel: usage gauges and per-interval process CPU time.

use serde::Serialize;

use super::overview::CPU_SECONDS_METRIC;
use super::{plain_window, Panel};
use crate::feed::FeedState;
use crate::feed_config::FeedConfig;
use crate::format::format_duration_seconds;
use crate::ingest::SeriesSpec;
use crate::projections::first_metric_value;
use crate::ringbuffer::SeriesPoint;

pub const PROCESS_CPU_USAGE: &str = "process_cpu_usage";
pub const SYSTEM_CPU_USAGE: &str = "system_cpu_usage";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CpuView {
    pub process_cpu_usage: Option<f64>,
    pub system_cpu_usage: Option<f64>,
    pub cpu_seconds_total: Option<f64>,
    pub cpu_seconds_display: String,
    /// CPU seconds consumed per poll interval.
    pub rate_series: Vec<SeriesPoint>,
    /// Percent of one core used between consecutive polls.
    pub utilization_series: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CpuPanel;

/// Converts per-interval CPU seconds into percent of one core.
///
/// The first point carries no delta and is skipped, as are points whose
/// timestamp does not advance.
pub fn utilization(rate_series: &[SeriesPoint]) -> Vec<SeriesPoint> {
    rate_series
        .windows(2)
        .filter_map(|pair| {
            let elapsed = (pair[1].timestamp - pair[0].timestamp) as f64 / 1000.0;
            (elapsed > 0.0).then(|| SeriesPoint::new(pair[1].timestamp, pair[1].value / elapsed * 100.0))
        })
        .collect()
}

impl Panel for CpuPanel {
    type View = CpuView;

    fn name(&self) -> &'static str {
        "cpu"
    }

    fn series(&self, config: &FeedConfig) -> Vec<SeriesSpec> {
        vec![SeriesSpec::counter(CPU_SECONDS_METRIC).with_capacity(config.history_points)]
    }

    fn project(&self, state: &FeedState) -> CpuView {
        let metrics = state.snapshot.as_ref().map(|s| &s.metrics);
        let cpu_seconds_total = metrics.and_then(|m| first_metric_value(m, CPU_SECONDS_METRIC));
        let rate_series = plain_window(&state.series, CPU_SECONDS_METRIC);

        CpuView {
            process_cpu_usage: metrics.and_then(|m| first_metric_value(m, PROCESS_CPU_USAGE)),
            system_cpu_usage: metrics.and_then(|m| first_metric_value(m, SYSTEM_CPU_USAGE)),
            cpu_seconds_total,
            cpu_seconds_display: format_duration_seconds(cpu_seconds_total),
            utilization_series: utilization(&rate_series),
            rate_series,
        }
    }
}
