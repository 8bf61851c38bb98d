//! JVM Metrics Feed Library
//!
//! Polls the Prometheus text exposition of one selected JVM process at a
//! fixed interval and turns it into a live feed: the latest parsed snapshot,
//! rolling per-series windows and per-interval deltas for counters. Several
//! independent consumers (the dashboard panels) read the same feed.
//!
//! # Features
//!
//! - **Exposition parsing**: tolerant line-by-line parser for the text format
//! - **Rolling windows**: fixed-capacity ringbuffers per series
//! - **Counter deltas**: reset-safe per-interval rates
//! - **Target switching**: stale results of a previous target never surface
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use jvm_metrics_feed::{
//!     default_series_specs, FeedConfig, HttpMetricsSource, PollScheduler, TargetId,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = FeedConfig::default();
//! let source = HttpMetricsSource::new(
//!     "http://127.0.0.1:8080/api/processes/{id}/metrics",
//!     Duration::from_secs(10),
//! )?;
//! let scheduler = PollScheduler::new(Arc::new(source), config.clone(), default_series_specs(&config));
//!
//! let mut feed = scheduler.subscribe();
//! scheduler.select(TargetId::new("12345"))?;
//! if let Some(state) = feed.wait_for(|s| s.snapshot.is_some()).await {
//!     println!("{} samples", state.summary().sample_count);
//! }
//! scheduler.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod exposition;
pub mod feed;
pub mod feed_config;
pub mod format;
pub mod ingest;
pub mod panels;
pub mod projections;
pub mod rate;
pub mod ringbuffer;
pub mod scheduler;
pub mod series_store;
pub mod snapshot;
pub mod source;
pub mod telemetry;

// Re-export main types for convenience
pub use error::{ConfigError, FetchError, SchedulerError};
pub use exposition::{parse, parse_document, parse_type_hints};
pub use feed::{FeedState, FeedSubscriber, FeedSummary};
pub use feed_config::FeedConfig;
pub use ingest::{Ingest, SeriesSpec};
pub use panels::{default_series_specs, Panel};
pub use projections::{first_metric_value, sum_metric, LabelFilter};
pub use rate::{MetricKind, RateDeriver};
pub use ringbuffer::SeriesPoint;
pub use scheduler::{PollScheduler, SchedulerState};
pub use series_store::{SeriesStore, SeriesView};
pub use snapshot::{Labels, MetricMap, MetricType, Sample, SeriesKey, Snapshot};
pub use source::{HttpMetricsSource, MetricsSource, TargetId};
pub use telemetry::FeedTelemetry;
