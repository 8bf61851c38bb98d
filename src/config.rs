//! Configuration management for jvm-metrics-feed.
//!
//! This module handles loading, merging, and validating configuration from files
//! and CLI arguments. It supports YAML, JSON, and TOML formats.

use crate::cli::{Args, ConfigFormat, LogLevel};
use clap::ValueEnum;
use jvm_metrics_feed::source::TARGET_PLACEHOLDER;
use jvm_metrics_feed::{ConfigError, FeedConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

// Default configuration constants
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 9480;
pub const DEFAULT_METRICS_URL_TEMPLATE: &str = "http://127.0.0.1:8080/api/processes/{id}/metrics";

const DEFAULT_CONFIG_PATHS: [&str; 3] = [
    "/etc/jvm-metrics-feed/config.yaml",
    "./jvm-metrics-feed.yaml",
    "./jvm-metrics-feed.json",
];

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // Server configuration
    pub port: Option<u16>,
    pub bind: Option<String>,

    // Source
    #[serde(alias = "metrics-url-template")]
    pub metrics_url_template: Option<String>,
    #[serde(alias = "initial-target")]
    pub initial_target: Option<String>,

    // Logging
    pub log_level: Option<String>,

    // Polling and retention
    #[serde(default)]
    pub feed: FeedConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: Some(DEFAULT_BIND_ADDR.to_string()),
            port: Some(DEFAULT_PORT),
            metrics_url_template: Some(DEFAULT_METRICS_URL_TEMPLATE.to_string()),
            initial_target: None,
            log_level: Some("info".into()),
            feed: FeedConfig::default(),
        }
    }
}

impl Config {
    pub fn url_template(&self) -> &str {
        self.metrics_url_template
            .as_deref()
            .unwrap_or(DEFAULT_METRICS_URL_TEMPLATE)
    }

    /// Effective log level; `info` when unset.
    pub fn effective_log_level(&self) -> Result<LogLevel, ConfigError> {
        match self.log_level.as_deref() {
            None => Ok(LogLevel::Info),
            Some(level) => LogLevel::from_str(level, true).map_err(|_| {
                ConfigError::Invalid(format!(
                    "Invalid log_level '{}' (expected off, error, warn, info, debug or trace)",
                    level
                ))
            }),
        }
    }
}

/// Validate effective config (used by --check-config and at startup)
pub fn validate_effective_config(cfg: &Config) -> Result<(), ConfigError> {
    cfg.feed.validate()?;
    cfg.effective_log_level()?;

    let template = cfg.url_template();
    if template.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "metrics_url_template must not be empty".into(),
        ));
    }
    if !template.contains(TARGET_PLACEHOLDER) {
        return Err(ConfigError::Invalid(format!(
            "metrics_url_template '{}' must contain the {} placeholder",
            template, TARGET_PLACEHOLDER
        )));
    }

    if let Some(bind) = cfg.bind.as_deref() {
        if bind.parse::<std::net::IpAddr>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "Invalid bind address '{}'",
                bind
            )));
        }
    }

    if cfg.initial_target.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ConfigError::Invalid("initial_target must not be empty".into()));
    }

    Ok(())
}

/// Resolves configuration from CLI args, config file, and defaults.
/// This enforces precedence: CLI (if provided) > config file > default.
pub fn resolve_config(args: &Args) -> Result<Config, ConfigError> {
    let mut config = if args.no_config {
        Config::default()
    } else {
        load_config(args.config.as_deref())?
    };

    if let Some(bind_ip) = args.bind {
        config.bind = Some(bind_ip.to_string());
    }
    if let Some(level) = &args.log_level {
        config.log_level = Some(level.as_str().to_string());
    }
    if let Some(cli_port) = args.port {
        config.port = Some(cli_port);
    }
    if let Some(template) = &args.metrics_url_template {
        config.metrics_url_template = Some(template.clone());
    }
    if let Some(target) = &args.target {
        config.initial_target = Some(target.clone());
    }
    if let Some(interval_ms) = args.interval_ms {
        config.feed.interval_ms = interval_ms;
    }
    if let Some(timeout_ms) = args.request_timeout_ms {
        config.feed.request_timeout_ms = timeout_ms;
    }

    Ok(config)
}

/// Loads a config file, or the first default location that exists.
/// No file at all yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists()),
    };

    let Some(path) = path.filter(|p| p.exists()) else {
        return Ok(Config::default());
    };

    let content = fs::read_to_string(&path)?;

    match path.extension().and_then(|s| s.to_str()) {
        Some("json") => {
            let config: Config = serde_json::from_str(&content)?;
            info!("Loaded JSON configuration from: {}", path.display());
            Ok(config)
        }
        Some("toml") => {
            let config: Config = toml::from_str(&content)?;
            info!("Loaded TOML configuration from: {}", path.display());
            Ok(config)
        }
        _ => {
            // Default to YAML
            let config: Config = serde_yaml::from_str(&content)?;
            info!("Loaded YAML configuration from: {}", path.display());
            Ok(config)
        }
    }
}

/// Renders configuration in the requested format
pub fn render_config(config: &Config, format: &ConfigFormat) -> Result<String, Box<dyn std::error::Error>> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => serde_yaml::to_string(config)?,
    })
}

/// Shows configuration in requested format
pub fn show_config(config: &Config, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render_config(config, &format)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_effective_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_load_yaml_partial() {
        let file = write_temp(
            ".yaml",
            "port: 9000\nfeed:\n  interval_ms: 1000\n",
        );
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.port, Some(9000));
        assert_eq!(config.feed.interval_ms, 1000);
        assert_eq!(config.feed.history_points, 120);
        assert!(config.metrics_url_template.is_none());
        assert_eq!(config.url_template(), DEFAULT_METRICS_URL_TEMPLATE);
    }

    #[test]
    fn test_load_json_and_toml() {
        let json = write_temp(".json", r#"{"initial_target": "42", "feed": {"history_points": 60}}"#);
        let config = load_config(Some(json.path())).unwrap();
        assert_eq!(config.initial_target.as_deref(), Some("42"));
        assert_eq!(config.feed.history_points, 60);

        let toml = write_temp(".toml", "port = 9100\n[feed]\ninterval_ms = 500\n");
        let config = load_config(Some(toml.path())).unwrap();
        assert_eq!(config.port, Some(9100));
        assert_eq!(config.feed.interval_ms, 500);
    }

    #[test]
    fn test_load_invalid_yaml() {
        let file = write_temp(".yaml", "port: [not a port\n");
        assert!(matches!(load_config(Some(file.path())), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_template_requires_placeholder() {
        let config = Config {
            metrics_url_template: Some("http://localhost/metrics".into()),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = write_temp(".yaml", "port: 9000\nfeed:\n  interval_ms: 1000\n");
        let path = file.path().to_string_lossy().to_string();
        let args = Args::parse_from([
            "jvm-metrics-feed",
            "--config",
            path.as_str(),
            "--port",
            "9999",
            "--interval-ms",
            "250",
            "--target",
            "7",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.port, Some(9999));
        assert_eq!(config.feed.interval_ms, 250);
        assert_eq!(config.initial_target.as_deref(), Some("7"));
    }

    #[test]
    fn test_log_level_from_file_unless_cli_given() {
        let file = write_temp(".yaml", "log_level: debug\n");
        let path = file.path().to_string_lossy().to_string();

        let args = Args::parse_from(["jvm-metrics-feed", "--config", path.as_str()]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.effective_log_level().unwrap(), LogLevel::Debug);

        let args = Args::parse_from([
            "jvm-metrics-feed",
            "--config",
            path.as_str(),
            "--log-level",
            "warn",
        ]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.effective_log_level().unwrap(), LogLevel::Warn);

        let args = Args::parse_from(["jvm-metrics-feed", "--no-config"]);
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.effective_log_level().unwrap(), LogLevel::Info);
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let config = Config {
            log_level: Some("loud".into()),
            ..Config::default()
        };
        assert!(matches!(
            validate_effective_config(&config),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_render_round_trips_yaml() {
        let rendered = render_config(&Config::default(), &ConfigFormat::Yaml).unwrap();
        let parsed: Config = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(parsed.feed, FeedConfig::default());
        assert_eq!(parsed.port, Some(DEFAULT_PORT));
    }
}
