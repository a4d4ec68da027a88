//! Connection-table sampling via `netstat` or `ss`
//!
//! Each sample spawns the listing tool once and returns its stdout. The child
//! is spawned with `kill_on_drop` and awaited under a timeout, so the process
//! and its pipes are released on every path out of [`Sampler::sample`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::process::Command;

use crate::config::{ConfigError, DEFAULT_COMMAND_TIMEOUT, ExporterConfig};

/// Errors that can occur while sampling the connection table
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// The listing command could not be run or exited unsuccessfully
    #[error("Failed to run `{program}`: {reason}")]
    CommandFailed {
        /// Program that was invoked
        program: String,
        /// Spawn error, exit status or timeout description
        reason: String,
    },
}

/// Connection-listing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandVariant {
    /// `netstat` from net-tools
    #[default]
    Netstat,
    /// `ss` from iproute2
    Ss,
}

impl CommandVariant {
    /// Program name looked up on `PATH`
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Netstat => "netstat",
            Self::Ss => "ss",
        }
    }

    /// Fixed arguments: TCP only, all sockets, numeric, IPv4
    #[must_use]
    pub const fn args(self) -> &'static [&'static str] {
        match self {
            Self::Netstat => &["-t", "-a", "-n", "--inet"],
            Self::Ss => &["-t", "-a", "-n", "-4"],
        }
    }
}

impl fmt::Display for CommandVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for CommandVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "netstat" => Ok(Self::Netstat),
            "ss" => Ok(Self::Ss),
            _ => Err(ConfigError::UnknownCommand(s.to_string())),
        }
    }
}

/// Runs `program args...` and returns its stdout.
///
/// # Errors
///
/// Returns [`SampleError::CommandFailed`] if the program cannot be spawned,
/// exits with a non-zero status or does not finish within `timeout`. Bytes
/// that are not UTF-8 are replaced, so the affected lines are skipped by the
/// parser instead of failing the sample.
pub async fn run_listing(
    program: &str,
    args: &[&str],
    timeout: Duration,
) -> Result<String, SampleError> {
    let failed = |reason: String| SampleError::CommandFailed {
        program: program.to_string(),
        reason,
    };

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => {
            if output.status.success() {
                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            } else {
                let stderr = String::from_utf8_lossy(&output.stderr);
                Err(failed(format!(
                    "exited with {}: {}",
                    output.status,
                    stderr.trim()
                )))
            }
        }
        Ok(Err(e)) => Err(failed(format!("failed to spawn process: {e}"))),
        Err(_) => Err(failed(format!(
            "timed out after {}",
            crate::config::format_duration(timeout)
        ))),
    }
}

/// Samples the connection table with one listing tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sampler {
    variant: CommandVariant,
    timeout: Duration,
}

impl Sampler {
    /// Creates a sampler
    #[must_use]
    pub const fn new(variant: CommandVariant, timeout: Duration) -> Self {
        Self { variant, timeout }
    }

    /// Creates a sampler for the configured command and timeout
    #[must_use]
    pub const fn from_config(config: &ExporterConfig) -> Self {
        Self::new(config.command, config.command_timeout)
    }

    /// Runs the listing tool once and returns its raw output.
    ///
    /// # Errors
    ///
    /// Returns [`SampleError::CommandFailed`]; see [`run_listing`].
    pub async fn sample(&self) -> Result<String, SampleError> {
        tracing::trace!(command = %self.variant, "Sampling connection table");
        run_listing(self.variant.program(), self.variant.args(), self.timeout).await
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::new(CommandVariant::default(), DEFAULT_COMMAND_TIMEOUT)
    }
}

/// Boxed future returned by [`command_exec_factory`] closures
pub type ExecFuture = Pin<Box<dyn Future<Output = Result<String, SampleError>> + Send>>;

/// Builds an exec closure for use with [`super::start_collector`].
///
/// Every call of the returned closure runs the listing tool once.
pub fn command_exec_factory(
    variant: CommandVariant,
    timeout: Duration,
) -> impl Fn() -> ExecFuture + Send + Sync + 'static {
    let sampler = Sampler::new(variant, timeout);
    move || Box::pin(async move { sampler.sample().await })
}
