//! Integration tests for the poll scheduler.
//!
//! A scripted in-memory source stands in for the HTTP endpoint; tokio's
//! paused clock makes interval timing deterministic.

use async_trait::async_trait;
use jvm_metrics_feed::telemetry::encode_text;
use jvm_metrics_feed::{
    first_metric_value, FeedConfig, FeedTelemetry, FetchError, MetricsSource, PollScheduler,
    SchedulerError, SchedulerState, SeriesKey, SeriesSpec, TargetId,
};
use prometheus::Registry;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Replays queued responses and records every call.
#[derive(Default)]
struct ScriptedSource {
    responses: Mutex<VecDeque<Result<String, FetchError>>>,
    delays: Mutex<Vec<(String, Duration)>>,
    calls: Mutex<Vec<(TargetId, Instant)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedSource {
    fn with_responses(responses: Vec<Result<String, FetchError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            ..Self::default()
        }
    }

    fn delay_target(self, target: &str, delay: Duration) -> Self {
        self.delays.lock().unwrap().push((target.to_string(), delay));
        self
    }

    fn calls_for(&self, target: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| t.as_str() == target)
            .count()
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }
}

#[async_trait]
impl MetricsSource for ScriptedSource {
    async fn fetch(&self, target: &TargetId) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push((target.clone(), Instant::now()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self
            .delays
            .lock()
            .unwrap()
            .iter()
            .find(|(t, _)| t == target.as_str())
            .map(|(_, d)| *d);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("{}_up 1\n", target)))
    }
}

fn scheduler(source: Arc<ScriptedSource>) -> PollScheduler {
    PollScheduler::new(
        source,
        FeedConfig::default(),
        vec![SeriesSpec::counter("work_total"), SeriesSpec::gauge("up")],
    )
}

#[tokio::test(start_paused = true)]
async fn test_error_keeps_last_snapshot_and_polling_continues() {
    let source = Arc::new(ScriptedSource::with_responses(vec![
        Ok("up 1\n".into()),
        Err(FetchError::Status {
            status: 503,
            message: "agent unavailable".into(),
        }),
        Ok("up 2\n".into()),
    ]));
    let scheduler = scheduler(source.clone());
    let mut feed = scheduler.subscribe();
    scheduler.select(TargetId::new("p1")).unwrap();

    let state = feed
        .wait_for(|s| s.snapshot.is_some() && !s.loading)
        .await
        .unwrap();
    assert_eq!(first_metric_value(&state.snapshot.as_ref().unwrap().metrics, "up"), Some(1.0));

    let state = feed.wait_for(|s| s.error.is_some()).await.unwrap();
    assert_eq!(state.error.as_deref(), Some("agent unavailable"));
    assert_eq!(first_metric_value(&state.snapshot.as_ref().unwrap().metrics, "up"), Some(1.0));

    let state = feed
        .wait_for(|s| {
            s.error.is_none()
                && s.snapshot
                    .as_ref()
                    .and_then(|snap| first_metric_value(&snap.metrics, "up"))
                    == Some(2.0)
        })
        .await
        .unwrap();
    assert!(!state.loading);
    assert_eq!(source.calls_for("p1"), 3);
    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_switching_target_discards_slow_response() {
    let source = Arc::new(
        ScriptedSource::default().delay_target("slow", Duration::from_secs(10)),
    );
    let scheduler = scheduler(source.clone());
    let mut feed = scheduler.subscribe();

    scheduler.select(TargetId::new("slow")).unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    scheduler.select(TargetId::new("fast")).unwrap();

    let state = feed.wait_for(|s| s.snapshot.is_some()).await.unwrap();
    assert_eq!(state.target, Some(TargetId::new("fast")));

    // Well past the moment the slow response would have landed.
    tokio::time::sleep(Duration::from_secs(30)).await;
    let state = scheduler.current();
    let snapshot = state.snapshot.unwrap();
    assert!(snapshot.metrics.contains_key("fast_up"));
    assert!(!snapshot.metrics.contains_key("slow_up"));
    assert_eq!(source.calls_for("slow"), 1);
    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_fetches_never_overlap() {
    // Each fetch takes longer than the interval.
    let source = Arc::new(ScriptedSource::default().delay_target("p1", Duration::from_secs(6)));
    let scheduler = scheduler(source.clone());
    scheduler.select(TargetId::new("p1")).unwrap();

    tokio::time::sleep(Duration::from_secs(45)).await;
    scheduler.shutdown().await;

    assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    let times = source.call_times();
    assert!(times.len() >= 3);
    for pair in times.windows(2) {
        // 6s fetch plus 4s interval after it completes.
        assert!(pair[1] - pair[0] >= Duration::from_secs(10));
    }
}

#[tokio::test(start_paused = true)]
async fn test_next_fetch_waits_one_interval() {
    let source = Arc::new(ScriptedSource::default());
    let scheduler = scheduler(source.clone());
    let start = Instant::now();
    scheduler.select(TargetId::new("p1")).unwrap();

    tokio::time::sleep(Duration::from_millis(8_500)).await;
    let times = source.call_times();
    assert_eq!(times.len(), 3);
    assert_eq!(times[0] - start, Duration::ZERO);
    assert_eq!(times[1] - times[0], Duration::from_secs(4));
    assert_eq!(times[2] - times[1], Duration::from_secs(4));
    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_clear_stops_polling() {
    let source = Arc::new(ScriptedSource::default());
    let scheduler = scheduler(source.clone());
    let mut feed = scheduler.subscribe();
    scheduler.select(TargetId::new("p1")).unwrap();
    feed.wait_for(|s| s.snapshot.is_some()).await.unwrap();

    scheduler.clear().unwrap();
    let state = scheduler.current();
    assert_eq!(scheduler.state(), SchedulerState::Idle);
    assert!(state.target.is_none());
    assert!(state.snapshot.is_none());
    assert!(state.error.is_none());
    assert!(!state.loading);
    assert!(state.series.is_empty());

    let calls = source.calls_for("p1");
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(source.calls_for("p1"), calls);
    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_series_restart_on_target_switch() {
    let source = Arc::new(ScriptedSource::with_responses(vec![
        Ok("work_total 10\n".into()),
        Ok("work_total 500\n".into()),
    ]));
    let scheduler = scheduler(source.clone());
    let mut feed = scheduler.subscribe();
    let key = SeriesKey::from_pairs("work_total", Vec::<(&str, &str)>::new());

    scheduler.select(TargetId::new("a")).unwrap();
    feed.wait_for(|s| s.snapshot.is_some()).await.unwrap();

    scheduler.select(TargetId::new("b")).unwrap();
    let state = feed
        .wait_for(|s| s.target == Some(TargetId::new("b")) && s.snapshot.is_some())
        .await
        .unwrap();

    // b starts from a fresh baseline: no delta against a's 10.
    let window = state.series.window(&key).unwrap();
    assert_eq!(window.len(), 1);
    assert_eq!(window[0].value, 0.0);
    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stopped_is_terminal() {
    let source = Arc::new(ScriptedSource::default());
    let scheduler = scheduler(source.clone());
    scheduler.select(TargetId::new("p1")).unwrap();
    scheduler.shutdown().await;

    assert_eq!(scheduler.state(), SchedulerState::Stopped);
    assert_eq!(scheduler.select(TargetId::new("p2")), Err(SchedulerError::Stopped));
    assert_eq!(scheduler.clear(), Err(SchedulerError::Stopped));

    let calls = source.call_times().len();
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert_eq!(source.call_times().len(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_consumers_see_the_same_snapshot() {
    let source = Arc::new(ScriptedSource::default());
    let scheduler = scheduler(source);
    let mut first = scheduler.subscribe();
    let mut second = scheduler.subscribe();
    scheduler.select(TargetId::new("p1")).unwrap();

    let a = first.wait_for(|s| s.snapshot.is_some()).await.unwrap();
    let b = second.wait_for(|s| s.snapshot.is_some()).await.unwrap();
    assert!(Arc::ptr_eq(a.snapshot.as_ref().unwrap(), b.snapshot.as_ref().unwrap()));
    scheduler.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_telemetry_counts_polls_and_failures() {
    let registry = Registry::new();
    let telemetry = FeedTelemetry::new(&registry).unwrap();
    let source = Arc::new(ScriptedSource::with_responses(vec![
        Ok("up 1\n".into()),
        Err(FetchError::Transport("connection refused".into())),
    ]));
    let scheduler = scheduler(source).with_telemetry(telemetry.clone());
    let mut feed = scheduler.subscribe();
    scheduler.select(TargetId::new("p1")).unwrap();
    feed.wait_for(|s| s.error.is_some()).await.unwrap();

    assert_eq!(telemetry.polls_total.get(), 2);
    assert_eq!(telemetry.poll_failures_total.get(), 1);
    assert_eq!(telemetry.target_switches_total.get(), 1);
    assert_eq!(telemetry.samples_last_poll.get(), 1);

    let text = encode_text(&registry).unwrap();
    assert!(text.contains("jvm_feed_poll_failures_total 1"));
    scheduler.shutdown().await;
}
