//! HTTP endpoint handlers for the feed server.
//!
//! This module provides handlers for all HTTP endpoints:
//! - `/`: Landing page
//! - `/feed`: Summary of the current feed state
//! - `/panels/{name}`: Projected panel views (overview, gc, heap, cpu)
//! - `/series`: Rolling windows of one metric
//! - `/target`: Select or clear the polled target
//! - `/metrics`: Prometheus self-metrics of the feed
//! - `/health`: Health check endpoint

pub mod feed;
pub mod health;
pub mod metrics;
pub mod panels;
pub mod root;
pub mod series;
pub mod target;

// Re-export handlers
pub use feed::feed_handler;
pub use health::health_handler;
pub use metrics::metrics_handler;
pub use panels::panel_handler;
pub use root::root_handler;
pub use series::series_handler;
pub use target::{clear_target_handler, select_target_handler};
