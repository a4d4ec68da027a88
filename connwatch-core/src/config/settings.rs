//! Exporter settings
//!
//! [`ExporterConfig::from_env`] reads the process environment once. Invalid
//! values are logged and replaced with defaults so a typo never keeps the
//! exporter from starting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use super::duration::{format_duration, parse_duration};
use crate::monitoring::{ColumnLayout, CommandVariant, MetricStyle, StatePolicy, exposition};

/// Default remote port whose connections are counted
pub const DEFAULT_TARGET_PORT: u16 = 8500;

/// Default delay between two samples
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default textfile-collector path
pub const DEFAULT_METRICS_FILE: &str = "/workspaces/metrics/tcp_connections.prom";

/// Default informational host name for one-shot runs
pub const DEFAULT_HOST: &str = "port-opener";

/// Upper bound for a single run of the listing command
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Environment variable names read by [`ExporterConfig::from_env`]
pub mod env_vars {
    /// Target remote port
    pub const TARGET_PORT: &str = "CONSUL_PORT";
    /// Poll interval as a duration string
    pub const POLL_INTERVAL: &str = "UPDATE_DELAY";
    /// Textfile output path
    pub const METRICS_FILE: &str = "METRICS_FILE";
    /// `netstat` or `ss`
    pub const COMMAND: &str = "CONNWATCH_COMMAND";
    /// `exclude-time-wait` or `established-only`
    pub const STATE_POLICY: &str = "CONNWATCH_STATE_POLICY";
    /// Metric base name
    pub const METRIC_NAME: &str = "CONNWATCH_METRIC_NAME";
}

/// Where the exposition fragment is published
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "path", rename_all = "lowercase")]
pub enum OutputTarget {
    /// Replace a file on every tick (textfile collector)
    File(PathBuf),
    /// Print once to standard output
    Stdout,
}

impl Default for OutputTarget {
    fn default() -> Self {
        Self::File(PathBuf::from(DEFAULT_METRICS_FILE))
    }
}

/// Exporter configuration, fixed at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    /// Remote port whose connections are counted
    pub target_port: u16,
    /// Delay between two ticks of the daemon loop
    pub poll_interval: Duration,
    /// Publication target
    pub output: OutputTarget,
    /// Connection-listing tool
    pub command: CommandVariant,
    /// Explicit counted-state policy; `None` follows the command variant
    pub policy: Option<StatePolicy>,
    /// Metric base name
    pub metric_name: String,
    /// Label or name-suffix placement of the port
    pub metric_style: MetricStyle,
    /// Upper bound for a single run of the listing command
    pub command_timeout: Duration,
    /// Informational host name (one-shot mode)
    pub host: String,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            target_port: DEFAULT_TARGET_PORT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            output: OutputTarget::default(),
            command: CommandVariant::default(),
            policy: None,
            metric_name: exposition::DEFAULT_METRIC_NAME.to_string(),
            metric_style: MetricStyle::default(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            host: DEFAULT_HOST.to_string(),
        }
    }
}

/// Parses a port number, rejecting `0`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidPort`] when the value is not an integer in
/// `1..=65535`.
pub fn parse_port(value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(ConfigError::InvalidPort(value.to_string())),
    }
}

fn parse_interval(value: &str) -> Result<Duration, ConfigError> {
    let interval = parse_duration(value)?;
    if interval.is_zero() {
        return Err(ConfigError::ZeroInterval);
    }
    Ok(interval)
}

fn parse_metrics_file(value: &str) -> Result<PathBuf, ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyOutputPath);
    }
    Ok(PathBuf::from(value))
}

fn parse_metric_name(value: &str) -> Result<String, ConfigError> {
    if exposition::is_valid_metric_name(value) {
        Ok(value.to_string())
    } else {
        Err(ConfigError::InvalidMetricName(value.to_string()))
    }
}

/// Reads and parses one variable; invalid values are logged and dropped
fn read_var<T, F, P>(lookup: &F, key: &str, parse: P) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    P: FnOnce(&str) -> Result<T, ConfigError>,
{
    let raw = lookup(key)?;
    match parse(raw.trim()) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(variable = key, error = %e, "Invalid environment value, using default");
            None
        }
    }
}

impl ExporterConfig {
    /// Builds a configuration from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    ///
    /// Unset variables keep their defaults; invalid ones are logged at warn
    /// level and also keep their defaults.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = read_var(&lookup, env_vars::TARGET_PORT, parse_port) {
            config.target_port = port;
        }
        if let Some(interval) = read_var(&lookup, env_vars::POLL_INTERVAL, parse_interval) {
            config.poll_interval = interval;
        }
        if let Some(path) = read_var(&lookup, env_vars::METRICS_FILE, parse_metrics_file) {
            config.output = OutputTarget::File(path);
        }
        if let Some(command) = read_var(&lookup, env_vars::COMMAND, str::parse::<CommandVariant>) {
            config.command = command;
        }
        if let Some(policy) = read_var(&lookup, env_vars::STATE_POLICY, str::parse::<StatePolicy>) {
            config.policy = Some(policy);
        }
        if let Some(name) = read_var(&lookup, env_vars::METRIC_NAME, parse_metric_name) {
            config.metric_name = name;
        }

        config
    }

    /// Sets the target port
    #[must_use]
    pub const fn with_target_port(mut self, port: u16) -> Self {
        self.target_port = port;
        self
    }

    /// Sets the poll interval
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the output target
    #[must_use]
    pub fn with_output(mut self, output: OutputTarget) -> Self {
        self.output = output;
        self
    }

    /// Sets the listing command
    #[must_use]
    pub const fn with_command(mut self, command: CommandVariant) -> Self {
        self.command = command;
        self
    }

    /// Pins the counted-state policy
    #[must_use]
    pub const fn with_policy(mut self, policy: StatePolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Sets the metric base name
    #[must_use]
    pub fn with_metric_name(mut self, name: impl Into<String>) -> Self {
        self.metric_name = name.into();
        self
    }

    /// Sets the metric style
    #[must_use]
    pub const fn with_metric_style(mut self, style: MetricStyle) -> Self {
        self.metric_style = style;
        self
    }

    /// Sets the listing command timeout
    #[must_use]
    pub const fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Sets the informational host name
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Checks values that flags can set without going through the env parsers.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_port == 0 {
            return Err(ConfigError::InvalidPort("0".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if let OutputTarget::File(path) = &self.output
            && path.as_os_str().is_empty()
        {
            return Err(ConfigError::EmptyOutputPath);
        }
        parse_metric_name(&self.metric_name)?;
        Ok(())
    }

    /// Returns the counted-state policy, falling back to the command default
    #[must_use]
    pub fn effective_policy(&self) -> StatePolicy {
        self.policy
            .unwrap_or_else(|| StatePolicy::default_for(self.command))
    }

    /// Returns the column layout of the configured command's output
    #[must_use]
    pub const fn layout(&self) -> ColumnLayout {
        ColumnLayout::for_command(self.command)
    }

    /// Returns the metrics file path in file mode
    #[must_use]
    pub fn metrics_file(&self) -> Option<&Path> {
        match &self.output {
            OutputTarget::File(path) => Some(path),
            OutputTarget::Stdout => None,
        }
    }

    /// Returns a serializable view with all defaults resolved
    #[must_use]
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            target_port: self.target_port,
            poll_interval: format_duration(self.poll_interval),
            command: self.command,
            policy: self.effective_policy(),
            metric_name: self.metric_name.clone(),
            metric_style: self.metric_style,
            command_timeout: format_duration(self.command_timeout),
            host: self.host.clone(),
            output: self.output.clone(),
        }
    }
}

/// Resolved configuration as printed by `connwatch config`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSummary {
    /// Target remote port
    pub target_port: u16,
    /// Poll interval in duration notation
    pub poll_interval: String,
    /// Listing command
    pub command: CommandVariant,
    /// Effective counted-state policy
    pub policy: StatePolicy,
    /// Metric base name
    pub metric_name: String,
    /// Port placement
    pub metric_style: MetricStyle,
    /// Listing command timeout in duration notation
    pub command_timeout: String,
    /// Informational host name
    pub host: String,
    /// Publication target (kept last so it renders as a trailing TOML table)
    pub output: OutputTarget,
}
