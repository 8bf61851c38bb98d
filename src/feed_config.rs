//! Configuration of the polling feed.
//!
//! Embedded in the binary's configuration file under the `feed` key; every
//! field has a default so partial files work.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Lowest accepted poll interval.
pub const MIN_INTERVAL_MS: u64 = 100;

/// Polling and retention settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Delay between the end of one fetch and the start of the next (default: 4000)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Points kept per series by default (default: 120)
    #[serde(default = "default_history_points")]
    pub history_points: usize,

    /// Points kept per GC collector and heap pool series (default: 180)
    #[serde(default = "default_pool_history_points")]
    pub pool_history_points: usize,

    /// Per-request timeout for the HTTP source (default: 10000)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_interval_ms() -> u64 {
    4000
}
fn default_history_points() -> usize {
    120
}
fn default_pool_history_points() -> usize {
    180
}
fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            history_points: default_history_points(),
            pool_history_points: default_pool_history_points(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl FeedConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms < MIN_INTERVAL_MS {
            return Err(ConfigError::Invalid(format!(
                "feed.interval_ms must be at least {} (got {})",
                MIN_INTERVAL_MS, self.interval_ms
            )));
        }
        if self.history_points == 0 || self.pool_history_points == 0 {
            return Err(ConfigError::Invalid(
                "feed.history_points and feed.pool_history_points must be at least 1".into(),
            ));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "feed.request_timeout_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
