//! Poll scheduler tying the feed to the currently selected target.
//!
//! States: `Idle` (nothing selected), `Polling(target)` and the terminal
//! `Stopped`. Selecting a target fetches immediately, then again one interval
//! after each fetch settles, so at most one request per target is ever in
//! flight. Changing or clearing the selection cancels the running sequence;
//! anything it produces afterwards is dropped by the generation check in
//! [`Feed::update_if_current`].

use chrono::Utc;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{FetchError, SchedulerError};
use crate::feed::{Feed, FeedState, FeedSubscriber};
use crate::feed_config::FeedConfig;
use crate::ingest::{Ingest, SeriesSpec};
use crate::snapshot::Snapshot;
use crate::source::{MetricsSource, TargetId};
use crate::telemetry::FeedTelemetry;

/// Lifecycle state of the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "target", rename_all = "lowercase")]
pub enum SchedulerState {
    Idle,
    Polling(TargetId),
    Stopped,
}

struct Inner {
    state: SchedulerState,
    generation: u64,
    cancel: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

/// Owns the polling lifecycle and the feed it publishes to.
///
/// `select`/`clear` spawn onto the current tokio runtime and must be called
/// from within one.
pub struct PollScheduler {
    source: Arc<dyn MetricsSource>,
    config: FeedConfig,
    specs: Arc<[SeriesSpec]>,
    feed: Arc<Feed>,
    telemetry: Option<FeedTelemetry>,
    inner: Mutex<Inner>,
}

impl PollScheduler {
    pub fn new(source: Arc<dyn MetricsSource>, config: FeedConfig, specs: Vec<SeriesSpec>) -> Self {
        Self {
            source,
            config,
            specs: specs.into(),
            feed: Arc::new(Feed::new()),
            telemetry: None,
            inner: Mutex::new(Inner {
                state: SchedulerState::Idle,
                generation: 0,
                cancel: None,
                task: None,
            }),
        }
    }

    pub fn with_telemetry(mut self, telemetry: FeedTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn subscribe(&self) -> FeedSubscriber {
        self.feed.subscribe()
    }

    /// Returns the latest published state.
    pub fn current(&self) -> FeedState {
        self.feed.current()
    }

    pub fn state(&self) -> SchedulerState {
        self.lock().state.clone()
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Starts polling `target`, replacing any running sequence.
    pub fn select(&self, target: TargetId) -> Result<(), SchedulerError> {
        self.set_target(Some(target))
    }

    /// Stops polling and publishes an empty state.
    pub fn clear(&self) -> Result<(), SchedulerError> {
        self.set_target(None)
    }

    /// Applies a selection change. Re-selecting the polled target is a no-op.
    pub fn set_target(&self, target: Option<TargetId>) -> Result<(), SchedulerError> {
        let mut inner = self.lock();

        match (&inner.state, &target) {
            (SchedulerState::Stopped, _) => return Err(SchedulerError::Stopped),
            (SchedulerState::Polling(current), Some(next)) if current == next => {
                debug!("Target {} already selected", next);
                return Ok(());
            }
            (SchedulerState::Idle, None) => return Ok(()),
            _ => {}
        }

        Self::cancel_running(&mut inner);
        inner.generation += 1;
        let generation = inner.generation;
        if let Some(t) = &self.telemetry {
            t.target_switches_total.inc();
            t.tracked_series.set(0);
        }

        let Some(target) = target else {
            self.feed.reset(FeedState {
                generation,
                ..FeedState::default()
            });
            inner.state = SchedulerState::Idle;
            info!("Target cleared, polling stopped");
            return Ok(());
        };

        let ingest = Ingest::new(&self.specs, self.config.history_points);
        self.feed.reset(FeedState {
            target: Some(target.clone()),
            series: ingest.view(),
            generation,
            ..FeedState::default()
        });

        let cancel = CancellationToken::new();
        let task = PollTask {
            target: target.clone(),
            generation,
            interval: self.config.interval(),
            source: self.source.clone(),
            feed: self.feed.clone(),
            ingest,
            cancel: cancel.clone(),
            telemetry: self.telemetry.clone(),
        };

        inner.task = Some(tokio::spawn(task.run()));
        inner.cancel = Some(cancel);
        inner.state = SchedulerState::Polling(target.clone());
        info!(
            "Polling target {} every {:?} (generation {})",
            target,
            self.config.interval(),
            generation
        );
        Ok(())
    }

    /// Cancels polling for good and waits for the running sequence to end.
    pub async fn shutdown(&self) {
        let task = {
            let mut inner = self.lock();
            if inner.state == SchedulerState::Stopped {
                return;
            }
            let task = inner.task.take();
            Self::cancel_running(&mut inner);
            inner.generation += 1;
            self.feed.reset(FeedState {
                generation: inner.generation,
                ..FeedState::default()
            });
            inner.state = SchedulerState::Stopped;
            task
        };

        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!("Poll task ended abnormally: {}", e);
            }
        }
        info!("Poll scheduler stopped");
    }

    fn cancel_running(inner: &mut Inner) {
        if let Some(cancel) = inner.cancel.take() {
            cancel.cancel();
        }
        // The cancelled task exits on its own; its results fail the
        // generation check if it gets that far.
        inner.task = None;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        if let Some(cancel) = self.lock().cancel.take() {
            cancel.cancel();
        }
    }
}

/// One poll sequence for one target.
struct PollTask {
    target: TargetId,
    generation: u64,
    interval: Duration,
    source: Arc<dyn MetricsSource>,
    feed: Arc<Feed>,
    ingest: Ingest,
    cancel: CancellationToken,
    telemetry: Option<FeedTelemetry>,
}

impl PollTask {
    async fn run(mut self) {
        debug!("Poll sequence {} started for {}", self.generation, self.target);

        loop {
            if !self.feed.update_if_current(self.generation, |s| s.loading = true) {
                break;
            }
            if let Some(t) = &self.telemetry {
                t.polls_total.inc();
            }

            let started = Instant::now();
            let result = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    debug!("Abandoning in-flight fetch for {}", self.target);
                    break;
                }
                result = self.source.fetch(&self.target) => result,
            };

            if !self.publish(result, started) {
                debug!("Discarded stale result for {}", self.target);
                if let Some(t) = &self.telemetry {
                    t.stale_results_total.inc();
                }
                break;
            }

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        debug!("Poll sequence {} for {} ended", self.generation, self.target);
    }

    /// Publishes one fetch outcome. Returns false if the sequence was
    /// superseded in the meantime.
    fn publish(&mut self, result: Result<String, FetchError>, started: Instant) -> bool {
        match result {
            Ok(body) => {
                let snapshot = Arc::new(Snapshot::from_payload(body, Utc::now()));
                let samples = snapshot.sample_count();
                let ingest = &mut self.ingest;
                let published = self.feed.update_if_current(self.generation, |state| {
                    ingest.ingest(&snapshot);
                    state.snapshot = Some(snapshot.clone());
                    state.error = None;
                    state.loading = false;
                });

                if published {
                    let series = self.ingest.view().len();
                    debug!(
                        "Published snapshot for {}: {} samples, {} series, {:.2}ms",
                        self.target,
                        samples,
                        series,
                        started.elapsed().as_secs_f64() * 1000.0
                    );
                    if let Some(t) = &self.telemetry {
                        t.poll_duration_seconds.set(started.elapsed().as_secs_f64());
                        t.samples_last_poll.set(samples as i64);
                        t.tracked_series.set(series as i64);
                    }
                }
                published
            }
            Err(e) => {
                warn!("Metrics fetch for {} failed: {}", self.target, e);
                if let Some(t) = &self.telemetry {
                    t.poll_failures_total.inc();
                    t.poll_duration_seconds.set(started.elapsed().as_secs_f64());
                }
                let message = e.to_string();
                self.feed.update_if_current(self.generation, |state| {
                    state.error = Some(message);
                    state.loading = false;
                })
            }
        }
    }
}
