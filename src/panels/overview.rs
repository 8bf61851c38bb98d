//! Overview panel: live threads, process CPU time and resident memory.

use serde::Serialize;

use super::{plain_window, Panel};
use crate::feed::FeedState;
use crate::feed_config::FeedConfig;
use crate::format::{format_bytes, format_duration_seconds};
use crate::ingest::SeriesSpec;
use crate::projections::{first_metric_value, first_metric_value_of};
use crate::ringbuffer::SeriesPoint;

pub const THREADS_METRIC: &str = "jvm_threads_current";
pub const AGENT_THREADS_METRIC: &str = "jvmdoctor_thread_count";
pub const CPU_SECONDS_METRIC: &str = "process_cpu_seconds_total";
pub const RSS_METRIC: &str = "process_resident_memory_bytes";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OverviewView {
    pub has_target: bool,
    pub live_threads: Option<f64>,
    pub cpu_process_seconds: Option<f64>,
    pub cpu_process_display: String,
    pub rss_bytes: Option<f64>,
    pub rss_display: String,
    /// Live thread count over time.
    pub thread_series: Vec<SeriesPoint>,
    /// CPU seconds consumed per poll interval.
    pub cpu_series: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OverviewPanel;

impl Panel for OverviewPanel {
    type View = OverviewView;

    fn name(&self) -> &'static str {
        "overview"
    }

    fn series(&self, config: &FeedConfig) -> Vec<SeriesSpec> {
        vec![
            SeriesSpec::gauge(THREADS_METRIC).with_capacity(config.history_points),
            SeriesSpec::gauge(AGENT_THREADS_METRIC).with_capacity(config.history_points),
            SeriesSpec::counter(CPU_SECONDS_METRIC).with_capacity(config.history_points),
        ]
    }

    fn project(&self, state: &FeedState) -> OverviewView {
        let metrics = state.snapshot.as_ref().map(|s| &s.metrics);

        let live_threads =
            metrics.and_then(|m| first_metric_value_of(m, &[THREADS_METRIC, AGENT_THREADS_METRIC]));
        let cpu_process_seconds = metrics.and_then(|m| first_metric_value(m, CPU_SECONDS_METRIC));
        let rss_bytes = metrics.and_then(|m| first_metric_value(m, RSS_METRIC));

        let mut thread_series = plain_window(&state.series, THREADS_METRIC);
        if thread_series.is_empty() {
            thread_series = plain_window(&state.series, AGENT_THREADS_METRIC);
        }

        OverviewView {
            has_target: state.target.is_some(),
            live_threads,
            cpu_process_seconds,
            cpu_process_display: format_duration_seconds(cpu_process_seconds),
            rss_bytes,
            rss_display: format_bytes(rss_bytes),
            thread_series,
            cpu_series: plain_window(&state.series, CPU_SECONDS_METRIC),
        }
    }
}
