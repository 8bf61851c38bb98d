//! CLI command implementations for jvm-metrics-feed.
//!
//! This module provides implementations for all CLI subcommands:
//! - `config`: Configuration file generation
//! - `probe`: Poll a target a few times and print the panel summaries

pub mod config;
pub mod probe;

// Re-export command functions
pub use config::command_config;
pub use probe::command_probe;
