//! Root endpoint handler for the landing page.
//!
//! Shows version, uptime and the polled target, followed by the list of
//! endpoints.

use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use std::fmt::Write as FmtWrite;
use tracing::{debug, instrument};

use crate::state::SharedState;

/// `(method, path, link, description)` of every route.
const ENDPOINTS: &[(&str, &str, Option<&str>, &str)] = &[
    ("GET", "/feed", Some("/feed"), "Current target, snapshot time, error and metric names"),
    ("GET", "/panels/overview", Some("/panels/overview"), "Threads, CPU time and resident memory"),
    ("GET", "/panels/gc", Some("/panels/gc"), "Per-collector GC time and collection rate"),
    ("GET", "/panels/heap", Some("/panels/heap"), "Heap usage over time and heap totals"),
    ("GET", "/panels/cpu", Some("/panels/cpu"), "CPU usage and per-interval CPU time"),
    ("GET", "/series?metric=NAME&labels=k=v", None, "Rolling windows of one metric"),
    ("PUT", "/target/ID", None, "Start polling a target"),
    ("DELETE", "/target", None, "Stop polling"),
    ("GET", "/metrics", Some("/metrics"), "Prometheus self-metrics of the feed"),
    ("GET", "/health", Some("/health"), "Scheduler state and last fetch outcome"),
];

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Handler for the root `/` endpoint.
#[instrument(skip(state))]
pub async fn root_handler(State(state): State<SharedState>) -> impl IntoResponse {
    debug!("Processing / request");

    let target = state
        .scheduler
        .current()
        .target
        .map(|t| escape_html(t.as_str()))
        .unwrap_or_else(|| "none".to_string());

    let mut rows = String::new();
    for (method, path, link, description) in ENDPOINTS {
        let path = escape_html(path);
        let cell = match link {
            Some(href) => format!("<a href=\"{href}\">{path}</a>"),
            None => format!("<code>{path}</code>"),
        };
        writeln!(
            rows,
            "<tr><td>{method}</td><td>{cell}</td><td>{description}</td></tr>"
        )
        .ok();
    }

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<title>JVM Metrics Feed</title>
<style>
body {{ font-family: sans-serif; margin: 2em auto; max-width: 860px; color: #222; }}
table {{ border-collapse: collapse; width: 100%; }}
td {{ border-bottom: 1px solid #ddd; padding: 6px 10px; }}
.meta span {{ margin-right: 2em; }}
</style>
</head>
<body>
<h1>JVM Metrics Feed</h1>
<p class="meta"><span>Version {version}</span><span>Uptime {uptime}</span><span>Target {target}</span><span>Interval {interval} ms</span></p>
<table>
{rows}</table>
</body>
</html>"#,
        version = env!("CARGO_PKG_VERSION"),
        uptime = state.uptime(),
        target = target,
        interval = state.config.feed.interval_ms,
        rows = rows,
    ))
}
