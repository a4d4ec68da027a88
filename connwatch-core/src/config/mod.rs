//! Configuration management for `connwatch`
//!
//! The exporter is configured once at startup from environment variables,
//! optionally overridden by command-line flags, and then passed by reference
//! into every component. Nothing mutates it afterwards.

pub mod duration;
mod settings;

pub use duration::{format_duration, parse_duration};
pub use settings::{
    ConfigSummary, DEFAULT_COMMAND_TIMEOUT, DEFAULT_HOST, DEFAULT_METRICS_FILE,
    DEFAULT_POLL_INTERVAL, DEFAULT_TARGET_PORT, ExporterConfig, OutputTarget, env_vars, parse_port,
};

/// Errors raised while interpreting configuration values
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Port is not an integer in `1..=65535`
    #[error("Invalid port '{0}': expected an integer between 1 and 65535")]
    InvalidPort(String),

    /// Duration string could not be parsed
    #[error("Invalid duration '{value}': {reason}")]
    InvalidDuration {
        /// The rejected input
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Polling interval must be positive
    #[error("Poll interval must be greater than zero")]
    ZeroInterval,

    /// Unknown connection-listing command
    #[error("Unknown command variant '{0}' (expected 'netstat' or 'ss')")]
    UnknownCommand(String),

    /// Unknown counted-state policy
    #[error("Unknown state policy '{0}' (expected 'exclude-time-wait' or 'established-only')")]
    UnknownPolicy(String),

    /// Unknown metric style
    #[error("Unknown metric style '{0}' (expected 'port-label' or 'port-in-name')")]
    UnknownMetricStyle(String),

    /// Metric name does not follow the Prometheus naming grammar
    #[error("Invalid metric name '{0}'")]
    InvalidMetricName(String),

    /// Output path is empty
    #[error("Metrics file path must not be empty")]
    EmptyOutputPath,
}
