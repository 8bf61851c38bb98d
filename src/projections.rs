//! Read-only projections over a snapshot's samples.
//!
//! Consumers derive everything they show from the latest snapshot with these
//! helpers. Each call is a linear scan of one metric's samples; nothing is
//! cached across snapshots.

use serde::{Deserialize, Serialize};

use crate::snapshot::{Labels, MetricMap, Sample};

/// Conjunction of `label == value` matchers. The empty filter matches all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFilter {
    matchers: Vec<(String, String)>,
}

impl LabelFilter {
    pub fn any() -> Self {
        Self::default()
    }

    /// Adds a `key == value` matcher.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.matchers.push((key.into(), value.into()));
        self
    }

    pub fn matches(&self, labels: &Labels) -> bool {
        self.matchers
            .iter()
            .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
    }

    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Parses `k=v,k2=v2` (values may be quoted).
    pub fn parse(text: &str) -> Self {
        let matchers = text
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.trim().trim_matches('"').to_string()))
            .filter(|(k, _)| !k.is_empty())
            .collect();
        Self { matchers }
    }
}

/// Predicate matching samples whose `key` label equals `value`.
pub fn label_equals<'a>(key: &'a str, value: &'a str) -> impl Fn(&Labels) -> bool + 'a {
    move |labels| labels.get(key).is_some_and(|v| v == value)
}

/// Returns the first sample of `name` accepted by `predicate`.
pub fn first_sample_where<'m, P>(metrics: &'m MetricMap, name: &str, predicate: P) -> Option<&'m Sample>
where
    P: Fn(&Labels) -> bool,
{
    metrics.get(name)?.iter().find(|s| predicate(&s.labels))
}

/// Returns the value of the first sample of `name`.
pub fn first_metric_value(metrics: &MetricMap, name: &str) -> Option<f64> {
    metrics.get(name)?.first().map(|s| s.value)
}

/// Returns the value of the first sample of `name` accepted by `predicate`.
pub fn first_metric_value_where<P>(metrics: &MetricMap, name: &str, predicate: P) -> Option<f64>
where
    P: Fn(&Labels) -> bool,
{
    first_sample_where(metrics, name, predicate).map(|s| s.value)
}

/// Returns the first value found among `names`, in order.
pub fn first_metric_value_of(metrics: &MetricMap, names: &[&str]) -> Option<f64> {
    names.iter().find_map(|name| first_metric_value(metrics, name))
}

/// Sums all samples of `name`. A missing metric sums to 0.
pub fn sum_metric(metrics: &MetricMap, name: &str) -> f64 {
    sum_metric_where(metrics, name, |_| true)
}

/// Sums the samples of `name` accepted by `predicate`.
pub fn sum_metric_where<P>(metrics: &MetricMap, name: &str, predicate: P) -> f64
where
    P: Fn(&Labels) -> bool,
{
    metrics
        .get(name)
        .map(|samples| {
            samples
                .iter()
                .filter(|s| predicate(&s.labels))
                .map(|s| s.value)
                .sum()
        })
        .unwrap_or(0.0)
}

/// Picks a display label for a series: the first of `keys` present, else
/// `fallback`.
pub fn display_label(labels: &Labels, keys: &[&str], fallback: &str) -> String {
    keys.iter()
        .find_map(|k| labels.get(*k).filter(|v| !v.is_empty()))
        .cloned()
        .unwrap_or_else(|| fallback.to_string())
}
