//! Prometheus self-metrics of the feed.
//!
//! These describe the polling itself (not the target's metrics) and are
//! served in text format by the binary's `/metrics` endpoint.

use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};

/// Counters and gauges updated by the poll loop.
#[derive(Clone)]
pub struct FeedTelemetry {
    pub polls_total: IntCounter,
    pub poll_failures_total: IntCounter,
    pub stale_results_total: IntCounter,
    pub target_switches_total: IntCounter,
    pub poll_duration_seconds: Gauge,
    pub samples_last_poll: IntGauge,
    pub tracked_series: IntGauge,
}

impl FeedTelemetry {
    pub fn new(registry: &Registry) -> Result<Self, prometheus::Error> {
        let polls_total = IntCounter::new(
            "jvm_feed_polls_total",
            "Number of fetches attempted against the selected target",
        )?;
        let poll_failures_total = IntCounter::new(
            "jvm_feed_poll_failures_total",
            "Number of fetches that failed (transport error or non-success status)",
        )?;
        let stale_results_total = IntCounter::new(
            "jvm_feed_stale_results_total",
            "Number of fetch results discarded because the target changed",
        )?;
        let target_switches_total = IntCounter::new(
            "jvm_feed_target_switches_total",
            "Number of target selections, changes and clears",
        )?;
        let poll_duration_seconds = Gauge::new(
            "jvm_feed_poll_duration_seconds",
            "Duration of the last fetch including parsing",
        )?;
        let samples_last_poll = IntGauge::new(
            "jvm_feed_samples_last_poll",
            "Number of samples parsed from the last successful fetch",
        )?;
        let tracked_series = IntGauge::new(
            "jvm_feed_tracked_series",
            "Number of series with a rolling window for the current target",
        )?;

        registry.register(Box::new(polls_total.clone()))?;
        registry.register(Box::new(poll_failures_total.clone()))?;
        registry.register(Box::new(stale_results_total.clone()))?;
        registry.register(Box::new(target_switches_total.clone()))?;
        registry.register(Box::new(poll_duration_seconds.clone()))?;
        registry.register(Box::new(samples_last_poll.clone()))?;
        registry.register(Box::new(tracked_series.clone()))?;

        Ok(Self {
            polls_total,
            poll_failures_total,
            stale_results_total,
            target_switches_total,
            poll_duration_seconds,
            samples_last_poll,
            tracked_series,
        })
    }
}

/// Encodes all metrics of `registry` in the text exposition format.
pub fn encode_text(registry: &Registry) -> Result<String, prometheus::Error> {
    let mut buffer = Vec::with_capacity(4096);
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}
