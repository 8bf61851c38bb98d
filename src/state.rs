//! Application state management for the feed server.
//!
//! This module defines the shared application state that is passed
//! to HTTP handlers.

use jvm_metrics_feed::PollScheduler;
use prometheus::Registry;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;

/// Type alias for shared application state.
pub type SharedState = Arc<AppState>;

/// Global application state shared across requests.
pub struct AppState {
    /// Owns polling of the selected target and the feed it publishes.
    pub scheduler: Arc<PollScheduler>,
    /// Self-telemetry of the feed.
    pub registry: Registry,
    pub config: Arc<Config>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Formats uptime as `1h 2m 3s`.
    pub fn uptime(&self) -> String {
        let uptime_secs = self.start_time.elapsed().as_secs();
        let hours = uptime_secs / 3600;
        let minutes = (uptime_secs % 3600) / 60;
        let seconds = uptime_secs % 60;
        format!("{}h {}m {}s", hours, minutes, seconds)
    }
}
