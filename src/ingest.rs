//! Per-target ingestion core.
//!
//! An [`Ingest`] owns the series store and the rate state of one target. The
//! scheduler creates a fresh one for every selected target and feeds it each
//! published snapshot; consumers only ever see the store through a
//! [`SeriesView`].

use ahash::AHashMap as HashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::projections::LabelFilter;
use crate::rate::{MetricKind, RateDeriver};
use crate::series_store::{SeriesStore, SeriesView};
use crate::snapshot::Snapshot;

/// A metric whose samples are recorded into rolling windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSpec {
    pub metric: String,
    #[serde(default)]
    pub kind: MetricKind,
    #[serde(default)]
    pub filter: LabelFilter,
    /// Window length; falls back to the store default.
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl SeriesSpec {
    pub fn new(metric: impl Into<String>, kind: MetricKind) -> Self {
        Self {
            metric: metric.into(),
            kind,
            filter: LabelFilter::any(),
            capacity: None,
        }
    }

    pub fn gauge(metric: impl Into<String>) -> Self {
        Self::new(metric, MetricKind::Gauge)
    }

    pub fn counter(metric: impl Into<String>) -> Self {
        Self::new(metric, MetricKind::Counter)
    }

    pub fn with_filter(mut self, filter: LabelFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// Series store plus counter state for a single target.
pub struct Ingest {
    specs: Vec<SeriesSpec>,
    store: Arc<SeriesStore>,
    rates: RateDeriver,
}

impl Ingest {
    /// Creates an empty ingest for the given tracked series.
    ///
    /// When several specs name the same metric, the first one wins.
    pub fn new(specs: &[SeriesSpec], default_capacity: usize) -> Self {
        let mut unique: Vec<SeriesSpec> = Vec::with_capacity(specs.len());
        let mut seen: HashMap<&str, &SeriesSpec> = HashMap::new();
        for spec in specs {
            match seen.get(spec.metric.as_str()) {
                Some(existing) if *existing != spec => {
                    warn!(
                        "Conflicting series specs for {}, keeping the first one",
                        spec.metric
                    );
                }
                Some(_) => {}
                None => {
                    seen.insert(spec.metric.as_str(), spec);
                    unique.push(spec.clone());
                }
            }
        }

        let store = unique.iter().fold(SeriesStore::new(default_capacity), |store, spec| {
            match spec.capacity {
                Some(capacity) => store.with_metric_capacity(spec.metric.clone(), capacity),
                None => store,
            }
        });

        Self {
            specs: unique,
            store: Arc::new(store),
            rates: RateDeriver::new(),
        }
    }

    /// Records every tracked sample of `snapshot`. Returns the number of
    /// points appended.
    pub fn ingest(&mut self, snapshot: &Snapshot) -> usize {
        let timestamp = snapshot.timestamp_ms();
        let mut appended = 0;

        for spec in &self.specs {
            let kind = spec.kind.resolve(&spec.metric, &snapshot.types);
            for sample in snapshot.samples(&spec.metric) {
                if !spec.filter.matches(&sample.labels) {
                    continue;
                }
                let key = sample.series_key();
                let value = match kind {
                    MetricKind::Counter => self.rates.derive(&key, sample.value),
                    _ => sample.value,
                };
                self.store.append(&key, timestamp, value);
                appended += 1;
            }
        }

        debug!(
            "Ingested {} points into {} series",
            appended,
            self.store.len()
        );
        appended
    }

    pub fn view(&self) -> SeriesView {
        SeriesView::new(self.store.clone())
    }

    pub fn specs(&self) -> &[SeriesSpec] {
        &self.specs
    }

    pub fn counter_series(&self) -> usize {
        self.rates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SeriesKey;
    use chrono::{TimeZone, Utc};

    fn snapshot(text: &str, secs: i64) -> Snapshot {
        Snapshot::from_payload(text.to_string(), Utc.timestamp_opt(secs, 0).unwrap())
    }

    #[test]
    fn test_counter_rate_end_to_end() {
        let mut ingest = Ingest::new(&[SeriesSpec::new("jvm_gc_collection_seconds_count", MetricKind::Auto)], 10);
        ingest.ingest(&snapshot("jvm_gc_collection_seconds_count{gc=\"G1 Young Generation\"} 10\n", 1));
        ingest.ingest(&snapshot("jvm_gc_collection_seconds_count{gc=\"G1 Young Generation\"} 13\n", 2));

        let key = SeriesKey::from_pairs("jvm_gc_collection_seconds_count", [("gc", "G1 Young Generation")]);
        let values: Vec<f64> = ingest.view().window(&key).unwrap().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![0.0, 3.0]);
        assert_eq!(ingest.counter_series(), 1);
    }

    #[test]
    fn test_gauge_passes_through() {
        let mut ingest = Ingest::new(&[SeriesSpec::gauge("jvm_threads_current")], 10);
        ingest.ingest(&snapshot("jvm_threads_current 12\n", 1));
        ingest.ingest(&snapshot("jvm_threads_current 9\n", 2));

        let key = SeriesKey::new("jvm_threads_current", Default::default());
        let window = ingest.view().window(&key).unwrap();
        assert_eq!(window[0].value, 12.0);
        assert_eq!(window[1].value, 9.0);
        assert_eq!(window[1].timestamp, 2000);
        assert_eq!(ingest.counter_series(), 0);
    }

    #[test]
    fn test_filter_and_capacity() {
        let spec = SeriesSpec::gauge("jvm_memory_bytes_used")
            .with_filter(LabelFilter::any().with("area", "heap"))
            .with_capacity(2);
        let mut ingest = Ingest::new(&[spec], 10);
        for i in 0..4 {
            let text = format!(
                "jvm_memory_bytes_used{{area=\"heap\"}} {}\njvm_memory_bytes_used{{area=\"nonheap\"}} 1\n",
                i
            );
            ingest.ingest(&snapshot(&text, i));
        }

        let view = ingest.view();
        assert_eq!(view.len(), 1);
        let key = SeriesKey::from_pairs("jvm_memory_bytes_used", [("area", "heap")]);
        let values: Vec<f64> = view.window(&key).unwrap().iter().map(|p| p.value).collect();
        assert_eq!(values, vec![2.0, 3.0]);
    }

    #[test]
    fn test_duplicate_specs_are_merged() {
        let specs = [
            SeriesSpec::counter("process_cpu_seconds_total"),
            SeriesSpec::counter("process_cpu_seconds_total"),
            SeriesSpec::gauge("process_cpu_seconds_total"),
        ];
        let ingest = Ingest::new(&specs, 10);
        assert_eq!(ingest.specs().len(), 1);
        assert_eq!(ingest.specs()[0].kind, MetricKind::Counter);
    }

    #[test]
    fn test_vanished_series_keep_their_window() {
        let mut ingest = Ingest::new(&[SeriesSpec::gauge("g")], 10);
        ingest.ingest(&snapshot("g{id=\"a\"} 1\ng{id=\"b\"} 2\n", 1));
        ingest.ingest(&snapshot("g{id=\"a\"} 3\n", 2));

        let view = ingest.view();
        let b = SeriesKey::from_pairs("g", [("id", "b")]);
        assert_eq!(view.window(&b).unwrap().len(), 1);
        let a = SeriesKey::from_pairs("g", [("id", "a")]);
        assert_eq!(view.window(&a).unwrap().len(), 2);
    }
}
