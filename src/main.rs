//! jvm-metrics-feed - version 0.1.0
//!
//! Live metrics feed server with tracing logging.
//! This is the main entry point that initializes the server and handles subcommands.

mod cli;
mod commands;
mod config;
mod handlers;
mod state;

use axum::{
    routing::{delete, get, put},
    Router,
};
use clap::Parser;
use jvm_metrics_feed::{
    default_series_specs, FeedTelemetry, HttpMetricsSource, PollScheduler, TargetId,
};
use prometheus::Registry;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::{net::TcpListener, signal};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info};

use cli::{Args, Commands, LogLevel};
use commands::{command_config, command_probe};
use config::{
    resolve_config, show_config, validate_effective_config, Config, DEFAULT_BIND_ADDR,
    DEFAULT_PORT,
};
use handlers::{
    clear_target_handler, feed_handler, health_handler, metrics_handler, panel_handler,
    root_handler, select_target_handler, series_handler,
};
use state::AppState;

fn level_filter(level: &LogLevel) -> LevelFilter {
    match level {
        LogLevel::Off => LevelFilter::OFF,
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}

/// Initializes tracing logging subsystem with the resolved log level.
fn setup_logging(level: &LogLevel) {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level_filter(level))
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("Logging initialized with level: {}", level.as_str());
}

/// Resolves and validates configuration.
/// Exits the process with error code 1 if validation fails.
fn load_validated_config(args: &Args) -> Result<Config, Box<dyn std::error::Error>> {
    let config = resolve_config(args)?;
    if let Err(e) = validate_effective_config(&config) {
        eprintln!("❌ Configuration invalid: {}", e);
        std::process::exit(1);
    }
    Ok(config)
}

/// Completes on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), shutting down gracefully...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

/// Main application entry point.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Early config resolution for show/check modes
    if args.show_config || args.check_config {
        let config = resolve_config(&args)?;

        if args.check_config {
            if let Err(e) = validate_effective_config(&config) {
                eprintln!("❌ Configuration invalid: {}", e);
                std::process::exit(1);
            }
            println!("✅ Configuration is valid");
            return Ok(());
        }

        return show_config(&config, args.config_format);
    }

    // Handle subcommands
    if let Some(command) = &args.command {
        return match command {
            Commands::Config {
                output,
                format,
                commented,
            } => command_config(output.clone(), format.clone(), *commented),

            Commands::Probe {
                target,
                iterations,
                verbose,
            } => {
                let config = load_validated_config(&args)?;
                setup_logging(&config.effective_log_level()?);
                command_probe(target.clone(), *iterations, *verbose, &config).await
            }
        };
    }

    // Load configuration for main server mode
    let config = load_validated_config(&args)?;

    setup_logging(&config.effective_log_level()?);

    info!("Starting jvm-metrics-feed");

    let bind_ip_str = config.bind.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
    let port = config.port.unwrap_or(DEFAULT_PORT);

    // Initialize Prometheus metrics registry
    let registry = Registry::new();
    let telemetry = FeedTelemetry::new(&registry)?;
    debug!("Prometheus registry initialized");

    let source = HttpMetricsSource::new(config.url_template(), config.feed.request_timeout())?;
    let specs = default_series_specs(&config.feed);
    debug!("Tracking {} series specs", specs.len());

    let scheduler = Arc::new(
        PollScheduler::new(Arc::new(source), config.feed.clone(), specs).with_telemetry(telemetry),
    );
    info!(
        "Poll scheduler initialized: interval {}ms, source {}",
        config.feed.interval_ms,
        config.url_template()
    );

    if let Some(target) = config.initial_target.as_deref() {
        scheduler.select(TargetId::new(target))?;
    }

    let state = Arc::new(AppState {
        scheduler: scheduler.clone(),
        registry,
        config: Arc::new(config.clone()),
        start_time: Instant::now(),
    });

    // Configure HTTP server routes
    let addr: SocketAddr = format!("{}:{}", bind_ip_str, port).parse()?;

    let app = Router::new()
        .route("/", get(root_handler))
        .route("/feed", get(feed_handler))
        .route("/panels/{name}", get(panel_handler))
        .route("/series", get(series_handler))
        .route("/target/{id}", put(select_target_handler))
        .route("/target", delete(clear_target_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    let listener = TcpListener::bind(addr).await?;
    info!(
        "jvm-metrics-feed listening on http://{}:{}",
        bind_ip_str, port
    );

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                error!("Server error: {}", e);
                scheduler.shutdown().await;
                return Err(e.into());
            }
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, exiting...");
        }
    }

    scheduler.shutdown().await;
    info!("jvm-metrics-feed stopped gracefully");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_off_disables_all_levels() {
        let filter = level_filter(&LogLevel::Off);
        assert_eq!(filter, LevelFilter::OFF);
        assert!(filter < LevelFilter::ERROR);
        assert_eq!(level_filter(&LogLevel::Error), LevelFilter::ERROR);
        assert_eq!(level_filter(&LogLevel::Trace), LevelFilter::TRACE);
    }
}
