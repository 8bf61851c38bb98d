//! Probe command implementation.
//!
//! Polls one target through the regular scheduler a few times and prints
//! what the panels would show.

use std::sync::Arc;
use std::time::Instant;

use jvm_metrics_feed::panels::{CpuPanel, GcPanel, HeapPanel, OverviewPanel};
use jvm_metrics_feed::{default_series_specs, HttpMetricsSource, Panel, PollScheduler, TargetId};

use crate::config::Config;

/// Polls `target` `iterations` times and prints panel summaries.
pub async fn command_probe(
    target: String,
    iterations: usize,
    verbose: bool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("🧪 JVM Metrics Feed - Probe");
    println!("===========================");
    println!("Template: {}", config.url_template());

    let source = HttpMetricsSource::new(config.url_template(), config.feed.request_timeout())?;
    let scheduler = PollScheduler::new(
        Arc::new(source),
        config.feed.clone(),
        default_series_specs(&config.feed),
    );
    let mut feed = scheduler.subscribe();

    let start = Instant::now();
    scheduler.select(TargetId::new(target))?;

    let mut completed = 0;
    while completed < iterations.max(1) {
        let Some(state) = feed.changed().await else {
            break;
        };
        if state.loading || (state.snapshot.is_none() && state.error.is_none()) {
            continue;
        }
        completed += 1;

        let summary = state.summary();
        println!(
            "\n🔄 Poll {}/{} after {:.1}s:",
            completed,
            iterations,
            start.elapsed().as_secs_f64()
        );
        if let Some(error) = &summary.error {
            println!("   ❌ {}", error);
            continue;
        }
        println!(
            "   📊 {} metrics, {} samples, {} tracked series",
            summary.metric_count, summary.sample_count, summary.series_count
        );

        let overview = OverviewPanel.project(&state);
        println!("   ├─ Threads: {}", overview.live_threads.map_or("N/A".into(), |v| v.to_string()));
        println!("   ├─ CPU time: {}", overview.cpu_process_display);
        println!("   ├─ RSS: {}", overview.rss_display);

        let heap = HeapPanel.project(&state);
        println!(
            "   ├─ Heap: {} used / {} committed / {} max",
            heap.summary.used_display, heap.summary.committed_display, heap.summary.max_display
        );

        let cpu = CpuPanel.project(&state);
        if let Some(last) = cpu.utilization_series.last() {
            println!("   ├─ CPU utilization: {:.1}%", last.value);
        }

        let gc = GcPanel.project(&state);
        for collector in &gc.collectors {
            println!(
                "   ├─ GC {}: {:.3}s in {} collections",
                collector.collector,
                collector.time_seconds,
                collector.count.map_or("?".into(), |c| c.to_string())
            );
        }

        if verbose {
            if let Some(snapshot) = &state.snapshot {
                for name in snapshot.metric_names() {
                    println!("   │  {} ({} samples)", name, snapshot.samples(name).len());
                }
            }
        }
    }

    scheduler.shutdown().await;
    println!("\n✅ Probe completed");
    Ok(())
}
