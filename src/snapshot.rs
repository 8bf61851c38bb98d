//! Core data model for parsed exposition data.
//!
//! A [`Snapshot`] is one fully parsed, timestamped observation of all metrics
//! returned by a single fetch. Snapshots are immutable once published and are
//! shared between consumers behind an `Arc`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::exposition;

/// Label set of a sample. Sorted by key, so equal sets compare and hash equal
/// regardless of the order they appeared in on the wire.
pub type Labels = BTreeMap<String, String>;

/// Samples grouped by metric name, each list in exposition order.
pub type MetricMap = BTreeMap<String, Vec<Sample>>;

/// A single labeled measurement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub name: String,
    pub labels: Labels,
    pub value: f64,
}

impl Sample {
    pub fn new(name: impl Into<String>, labels: Labels, value: f64) -> Self {
        Self {
            name: name.into(),
            labels,
            value,
        }
    }

    /// Returns the identity of the series this sample belongs to.
    pub fn series_key(&self) -> SeriesKey {
        SeriesKey::new(self.name.clone(), self.labels.clone())
    }

    /// Returns the value of a label, if present.
    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }
}

/// Metric type announced by a `# TYPE` comment line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
    Summary,
    Untyped,
}

impl MetricType {
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "counter" => Some(Self::Counter),
            "gauge" => Some(Self::Gauge),
            "histogram" => Some(Self::Histogram),
            "summary" => Some(Self::Summary),
            "untyped" => Some(Self::Untyped),
            _ => None,
        }
    }
}

/// Canonical identity of one time series: metric name plus label set.
///
/// The canonical text form is `name{k1="v1",k2="v2"}` with keys in ascending
/// order, or just `name` when the label set is empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    metric: String,
    labels: Labels,
}

impl SeriesKey {
    pub fn new(metric: impl Into<String>, labels: Labels) -> Self {
        Self {
            metric: metric.into(),
            labels,
        }
    }

    /// Builds a key from `(key, value)` pairs in any order.
    pub fn from_pairs<K, V>(metric: impl Into<String>, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let labels = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(metric, labels)
    }

    pub fn metric(&self) -> &str {
        &self.metric
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    pub fn label(&self, key: &str) -> Option<&str> {
        self.labels.get(key).map(String::as_str)
    }

    /// Returns the canonical text encoding of this key.
    pub fn canonical(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.metric)?;
        if self.labels.is_empty() {
            return Ok(());
        }
        f.write_str("{")?;
        for (i, (k, v)) in self.labels.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}=\"", k)?;
            for ch in v.chars() {
                match ch {
                    '\\' => f.write_str("\\\\")?,
                    '"' => f.write_str("\\\"")?,
                    '\n' => f.write_str("\\n")?,
                    _ => write!(f, "{}", ch)?,
                }
            }
            f.write_str("\"")?;
        }
        f.write_str("}")
    }
}

impl Serialize for SeriesKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

/// One parsed, timestamped observation of all metrics from a single fetch.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub timestamp: DateTime<Utc>,
    pub metrics: MetricMap,
    /// `# TYPE` hints found in the payload, keyed by family name.
    pub types: BTreeMap<String, MetricType>,
    #[serde(skip)]
    pub raw: String,
}

impl Snapshot {
    /// Parses a raw exposition payload and stamps it with `timestamp`.
    pub fn from_payload(raw: String, timestamp: DateTime<Utc>) -> Self {
        let document = exposition::parse_document(&raw);
        Self {
            timestamp,
            metrics: document.metrics,
            types: document.types,
            raw,
        }
    }

    /// Returns the samples for a metric name, or an empty slice.
    pub fn samples(&self, name: &str) -> &[Sample] {
        self.metrics.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Unix timestamp in milliseconds.
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    pub fn sample_count(&self) -> usize {
        self.metrics.values().map(Vec::len).sum()
    }
}
