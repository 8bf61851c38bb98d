//! Counter-to-rate derivation.
//!
//! Cumulative counters are turned into per-interval deltas. The previous
//! cumulative value is remembered per series; a counter that goes backwards
//! (target restart, overflow) yields a delta of zero and becomes the new
//! baseline.

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::snapshot::{MetricType, SeriesKey};

/// Name suffixes that mark a metric as a cumulative counter.
const COUNTER_SUFFIXES: &[&str] = &["_total", "_count", "_sum"];

/// Child suffixes looked up against a family's `# TYPE` hint. Histogram
/// buckets are cumulative, but only count as counters when the family is hinted.
const FAMILY_SUFFIXES: &[&str] = &["_total", "_count", "_sum", "_bucket"];

/// How a tracked metric's values are turned into series points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// Cumulative counter, stored as per-interval delta.
    Counter,
    /// Raw value, stored as-is.
    Gauge,
    /// Decide from `# TYPE` hints, then from the metric name.
    #[default]
    Auto,
}

impl MetricKind {
    /// Resolves `Auto` to `Counter` or `Gauge` for a concrete sample name.
    pub fn resolve(self, name: &str, types: &BTreeMap<String, MetricType>) -> MetricKind {
        match self {
            MetricKind::Auto => {
                if is_counter(name, types) {
                    MetricKind::Counter
                } else {
                    MetricKind::Gauge
                }
            }
            kind => kind,
        }
    }
}

/// Returns true if `name` ends in a conventional counter suffix.
pub fn is_counter_name(name: &str) -> bool {
    COUNTER_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// Classifies a sample name using type hints first, naming convention second.
pub fn is_counter(name: &str, types: &BTreeMap<String, MetricType>) -> bool {
    if let Some(kind) = types.get(name) {
        return *kind == MetricType::Counter;
    }
    for suffix in FAMILY_SUFFIXES {
        let Some(family) = name.strip_suffix(suffix) else {
            continue;
        };
        match types.get(family) {
            Some(MetricType::Counter | MetricType::Histogram | MetricType::Summary) => return true,
            Some(_) => return false,
            None => {}
        }
    }
    is_counter_name(name)
}

/// Remembers the last cumulative value per series.
#[derive(Debug, Default)]
pub struct RateDeriver {
    previous: HashMap<SeriesKey, f64>,
}

impl RateDeriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the non-negative delta since the previous observation.
    ///
    /// The first observation of a series returns 0. The current value always
    /// becomes the new baseline, also when the delta was clamped.
    pub fn derive(&mut self, key: &SeriesKey, cumulative: f64) -> f64 {
        match self.previous.insert(key.clone(), cumulative) {
            Some(previous) => (cumulative - previous).max(0.0),
            None => 0.0,
        }
    }

    /// Returns the last recorded cumulative value of a series.
    pub fn previous(&self, key: &SeriesKey) -> Option<f64> {
        self.previous.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }

    pub fn reset(&mut self) {
        self.previous.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> SeriesKey {
        SeriesKey::from_pairs("jvm_gc_collection_seconds_count", [("gc", "G1 Young Generation")])
    }

    #[test]
    fn test_first_observation_is_zero() {
        let mut rates = RateDeriver::new();
        assert_eq!(rates.derive(&key(), 10.0), 0.0);
        assert_eq!(rates.previous(&key()), Some(10.0));
    }

    #[test]
    fn test_delta_and_reset_clamp() {
        let mut rates = RateDeriver::new();
        assert_eq!(rates.derive(&key(), 10.0), 0.0);
        assert_eq!(rates.derive(&key(), 13.0), 3.0);
        // Counter went backwards: clamp, and rebase on the smaller value
        assert_eq!(rates.derive(&key(), 2.0), 0.0);
        assert_eq!(rates.derive(&key(), 5.0), 3.0);
    }

    #[test]
    fn test_series_are_independent() {
        let mut rates = RateDeriver::new();
        let old = SeriesKey::from_pairs("jvm_gc_collection_seconds_count", [("gc", "G1 Old Generation")]);
        rates.derive(&key(), 100.0);
        assert_eq!(rates.derive(&old, 1.0), 0.0);
        assert_eq!(rates.derive(&key(), 101.0), 1.0);
        assert_eq!(rates.len(), 2);

        rates.reset();
        assert!(rates.is_empty());
        assert_eq!(rates.derive(&key(), 150.0), 0.0);
    }

    #[test]
    fn test_counter_name_convention() {
        assert!(is_counter_name("process_cpu_seconds_total"));
        assert!(is_counter_name("jvm_gc_collection_seconds_count"));
        assert!(is_counter_name("jvm_gc_collection_seconds_sum"));
        assert!(!is_counter_name("jvm_threads_current"));
        assert!(!is_counter_name("jvm_memory_bytes_used"));
    }

    #[test]
    fn test_type_hints_take_precedence() {
        let mut types = BTreeMap::new();
        types.insert("weird_total".to_string(), MetricType::Gauge);
        types.insert("jvm_gc_collection_seconds".to_string(), MetricType::Summary);
        types.insert("requests".to_string(), MetricType::Counter);
        types.insert("queue_sum".to_string(), MetricType::Gauge);

        assert!(!is_counter("weird_total", &types));
        assert!(is_counter("jvm_gc_collection_seconds_count", &types));
        assert!(is_counter("requests_total", &types));
        assert!(!is_counter("queue_sum", &types));
        assert!(is_counter("unhinted_total", &types));
    }

    #[test]
    fn test_histogram_buckets_follow_family_hint() {
        let mut types = BTreeMap::new();
        types.insert("http_request_duration_seconds".to_string(), MetricType::Histogram);

        assert!(is_counter("http_request_duration_seconds_bucket", &types));
        assert_eq!(
            MetricKind::Auto.resolve("http_request_duration_seconds_bucket", &types),
            MetricKind::Counter
        );
        assert!(!is_counter("unhinted_bucket", &types));
    }

    #[test]
    fn test_kind_resolution() {
        let types = BTreeMap::new();
        assert_eq!(MetricKind::Auto.resolve("x_total", &types), MetricKind::Counter);
        assert_eq!(MetricKind::Auto.resolve("x_bytes", &types), MetricKind::Gauge);
        assert_eq!(MetricKind::Gauge.resolve("x_total", &types), MetricKind::Gauge);
        assert_eq!(MetricKind::Counter.resolve("x_bytes", &types), MetricKind::Counter);
    }
}
