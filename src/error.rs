//! Error types for the metrics feed.

/// A failed fetch of the exposition text. The `Display` output is what
/// consumers see as the transient feed error.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to reach target: {0}")]
    Transport(String),

    /// Non-success HTTP status. Carries the response body when there was one.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Failed to read metrics response: {0}")]
    Body(String),

    #[error("Invalid metrics URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Errors returned by the poll scheduler.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Scheduler has been stopped")]
    Stopped,
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("{0}")]
    Invalid(String),
}
