//! Series store holding one rolling window per series.
//!
//! This module provides the `SeriesStore` which maintains a collection of
//! ringbuffers, one per [`SeriesKey`], created lazily on first observation.
//! Series that stop appearing in the exposition keep their window; windows
//! are only dropped when the store itself is discarded on a target switch.

use ahash::AHashMap as HashMap;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;

use crate::ringbuffer::{Ringbuffer, SeriesPoint, POINT_SIZE_BYTES};
use crate::snapshot::SeriesKey;

/// Statistics about the series store.
#[derive(Debug, Clone, Serialize)]
pub struct SeriesStoreStats {
    pub default_capacity: usize,
    pub total_series: usize,
    pub total_points: usize,
    pub point_size_bytes: usize,
    pub estimated_ram_bytes: usize,
}

/// Manager for multiple ringbuffers, one per series.
///
/// Appends come from the polling task only; readers may query concurrently.
pub struct SeriesStore {
    buffers: DashMap<SeriesKey, Ringbuffer>,
    default_capacity: usize,
    metric_capacities: HashMap<String, usize>,
}

impl SeriesStore {
    /// Creates a store whose windows hold `default_capacity` points.
    pub fn new(default_capacity: usize) -> Self {
        Self {
            buffers: DashMap::new(),
            default_capacity: default_capacity.max(1),
            metric_capacities: HashMap::new(),
        }
    }

    /// Overrides the window length for every series of `metric`.
    ///
    /// Only affects windows created after the call.
    pub fn with_metric_capacity(mut self, metric: impl Into<String>, capacity: usize) -> Self {
        self.metric_capacities.insert(metric.into(), capacity.max(1));
        self
    }

    /// Returns the window length used for series of `metric`.
    pub fn capacity_for(&self, metric: &str) -> usize {
        self.metric_capacities
            .get(metric)
            .copied()
            .unwrap_or(self.default_capacity)
    }

    /// Appends a point to the series, dropping the oldest when full.
    pub fn append(&self, key: &SeriesKey, timestamp: i64, value: f64) {
        let point = SeriesPoint::new(timestamp, value);
        if let Some(mut buffer) = self.buffers.get_mut(key) {
            buffer.push(point);
            return;
        }
        let capacity = self.capacity_for(key.metric());
        self.buffers
            .entry(key.clone())
            .or_insert_with(|| Ringbuffer::new(capacity))
            .push(point);
    }

    /// Returns the window of a series, oldest first.
    ///
    /// Returns None if the series was never observed.
    pub fn window(&self, key: &SeriesKey) -> Option<Vec<SeriesPoint>> {
        self.buffers.get(key).map(|rb| rb.points())
    }

    /// Returns the newest point of a series.
    pub fn latest(&self, key: &SeriesKey) -> Option<SeriesPoint> {
        self.buffers.get(key).and_then(|rb| rb.latest())
    }

    /// Returns every window of `metric`, sorted by series key.
    pub fn series_for_metric(&self, metric: &str) -> Vec<(SeriesKey, Vec<SeriesPoint>)> {
        let mut series: Vec<_> = self
            .buffers
            .iter()
            .filter(|entry| entry.key().metric() == metric)
            .map(|entry| (entry.key().clone(), entry.value().points()))
            .collect();
        series.sort_by(|a, b| a.0.cmp(&b.0));
        series
    }

    /// Returns all known series keys, sorted.
    pub fn keys(&self) -> Vec<SeriesKey> {
        let mut keys: Vec<_> = self.buffers.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.buffers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Returns statistics about the store.
    pub fn stats(&self) -> SeriesStoreStats {
        let total_points: usize = self.buffers.iter().map(|e| e.value().len()).sum();
        let allocated: usize = self.buffers.iter().map(|e| e.value().capacity()).sum();

        SeriesStoreStats {
            default_capacity: self.default_capacity,
            total_series: self.buffers.len(),
            total_points,
            point_size_bytes: POINT_SIZE_BYTES,
            estimated_ram_bytes: allocated * POINT_SIZE_BYTES,
        }
    }
}

/// Read-only handle to a [`SeriesStore`] handed to consumers.
#[derive(Clone)]
pub struct SeriesView {
    store: Arc<SeriesStore>,
}

impl SeriesView {
    pub fn new(store: Arc<SeriesStore>) -> Self {
        Self { store }
    }

    pub fn window(&self, key: &SeriesKey) -> Option<Vec<SeriesPoint>> {
        self.store.window(key)
    }

    pub fn latest(&self, key: &SeriesKey) -> Option<SeriesPoint> {
        self.store.latest(key)
    }

    pub fn series_for_metric(&self, metric: &str) -> Vec<(SeriesKey, Vec<SeriesPoint>)> {
        self.store.series_for_metric(metric)
    }

    pub fn keys(&self) -> Vec<SeriesKey> {
        self.store.keys()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn stats(&self) -> SeriesStoreStats {
        self.store.stats()
    }
}

impl Default for SeriesView {
    fn default() -> Self {
        Self::new(Arc::new(SeriesStore::new(1)))
    }
}

impl std::fmt::Debug for SeriesView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeriesView")
            .field("series", &self.store.len())
            .finish()
    }
}
