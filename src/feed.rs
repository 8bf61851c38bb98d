//! Snapshot distribution to independent consumers.
//!
//! The feed is a single current-value cell (`tokio::sync::watch`). Every
//! consumer can re-read the latest [`FeedState`] or wait for the next change;
//! none of them can mutate what was published.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

use crate::series_store::SeriesView;
use crate::snapshot::Snapshot;
use crate::source::TargetId;

/// What consumers observe after each publish.
#[derive(Debug, Clone, Default)]
pub struct FeedState {
    /// Currently selected target, if any.
    pub target: Option<TargetId>,
    /// Latest successfully parsed snapshot for `target`.
    pub snapshot: Option<Arc<Snapshot>>,
    /// Latest fetch error, cleared by the next success.
    pub error: Option<String>,
    /// True while a fetch is in flight.
    pub loading: bool,
    /// Rolling windows for `target`.
    pub series: SeriesView,
    /// Poll sequence that produced this state.
    pub generation: u64,
}

impl FeedState {
    /// Compact description used by the HTTP surface and logs.
    pub fn summary(&self) -> FeedSummary {
        FeedSummary {
            target: self.target.clone(),
            timestamp_ms: self.snapshot.as_ref().map(|s| s.timestamp_ms()),
            error: self.error.clone(),
            loading: self.loading,
            metric_count: self.snapshot.as_ref().map_or(0, |s| s.metrics.len()),
            sample_count: self.snapshot.as_ref().map_or(0, |s| s.sample_count()),
            series_count: self.series.len(),
            generation: self.generation,
        }
    }
}

/// Serializable summary of a [`FeedState`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FeedSummary {
    pub target: Option<TargetId>,
    pub timestamp_ms: Option<i64>,
    pub error: Option<String>,
    pub loading: bool,
    pub metric_count: usize,
    pub sample_count: usize,
    pub series_count: usize,
    pub generation: u64,
}

/// Publisher side of the feed.
pub struct Feed {
    tx: watch::Sender<FeedState>,
}

impl Default for Feed {
    fn default() -> Self {
        Self::new()
    }
}

impl Feed {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(FeedState::default());
        Self { tx }
    }

    /// Registers a new consumer.
    pub fn subscribe(&self) -> FeedSubscriber {
        FeedSubscriber {
            rx: self.tx.subscribe(),
        }
    }

    /// Returns a copy of the current state.
    pub fn current(&self) -> FeedState {
        self.tx.borrow().clone()
    }

    /// Replaces the state unconditionally. Used on target transitions.
    pub(crate) fn reset(&self, state: FeedState) {
        self.tx.send_replace(state);
    }

    /// Applies `update` only if the feed still belongs to `generation`.
    ///
    /// The check and the update happen under the same lock, so a poll
    /// sequence that was superseded can never write into the new target's
    /// state. Returns false when the update was discarded.
    pub(crate) fn update_if_current<F>(&self, generation: u64, update: F) -> bool
    where
        F: FnOnce(&mut FeedState),
    {
        let mut applied = false;
        self.tx.send_if_modified(|state| {
            if state.generation != generation {
                return false;
            }
            update(state);
            applied = true;
            true
        });
        applied
    }
}

/// Consumer side of the feed.
#[derive(Clone)]
pub struct FeedSubscriber {
    rx: watch::Receiver<FeedState>,
}

impl FeedSubscriber {
    /// Returns the latest state without waiting.
    pub fn latest(&self) -> FeedState {
        self.rx.borrow().clone()
    }

    /// Waits for the next publish and returns the new state.
    ///
    /// Returns None once the publisher is gone.
    pub async fn changed(&mut self) -> Option<FeedState> {
        self.rx.changed().await.ok()?;
        Some(self.rx.borrow_and_update().clone())
    }

    /// Waits until `predicate` holds for the current state.
    pub async fn wait_for<P>(&mut self, mut predicate: P) -> Option<FeedState>
    where
        P: FnMut(&FeedState) -> bool,
    {
        self.rx
            .wait_for(|state| predicate(state))
            .await
            .ok()
            .map(|state| state.clone())
    }
}
