//! Config command implementation.
//!
//! Writes a default configuration file, optionally annotated.

use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;
use crate::config::{render_config, Config};

/// Generates configuration files.
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    let output = match output {
        Some(path) => path,
        None => PathBuf::from("jvm-metrics-feed.yaml"),
    };

    let mut content = render_config(&config, &format)?;
    if commented && matches!(format, ConfigFormat::Yaml) {
        content = add_config_comments(content);
    }

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Adds comments to YAML configuration.
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# JVM Metrics Feed Configuration
# ==============================
#
# Server Configuration
# --------------------
# bind: "127.0.0.1"            # Bind IP
# port: 9480                   # HTTP port
#
# Source
# ------
# metrics_url_template: "http://127.0.0.1:8080/api/processes/{id}/metrics"
#                              # {id} is replaced by the selected target
# initial_target: null         # Target to poll at startup
#
# Logging
# -------
# log_level: "info"            # off, error, warn, info, debug, trace
#
# Feed
# ----
# feed:
#   interval_ms: 4000          # Delay between the end of one fetch and the next (>= 100)
#   history_points: 120        # Points kept per series
#   pool_history_points: 180   # Points kept per GC collector / heap series
#   request_timeout_ms: 10000  # Per-request timeout
"#;

    format!("{comments}\n{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_config_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("feed.yaml");
        command_config(Some(path.clone()), ConfigFormat::Yaml, true).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("# JVM Metrics Feed Configuration"));
        let parsed: Config = serde_yaml::from_str(&content).unwrap();
        assert_eq!(parsed.feed.interval_ms, 4000);
    }
}
