//! Parser for connection-table listings
//!
//! Both supported tools print one connection per line with whitespace-separated
//! columns. Which column holds the state and which holds the remote address is
//! described by a [`ColumnLayout`], so adding a tool means adding a layout, not
//! another parser.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::sampler::CommandVariant;
use crate::config::ConfigError;

/// Column positions of one tool's output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    /// Index of the connection state token
    pub state_column: usize,
    /// Index of the remote `address:port` token
    pub remote_column: usize,
    /// Lines with fewer tokens are headers or noise
    pub min_fields: usize,
}

impl ColumnLayout {
    /// `netstat -tn`: `Proto Recv-Q Send-Q Local Foreign State`
    pub const NETSTAT: Self = Self {
        state_column: 5,
        remote_column: 4,
        min_fields: 6,
    };

    /// `ss -tn`: `State Recv-Q Send-Q Local Peer [Process]`
    pub const SS: Self = Self {
        state_column: 0,
        remote_column: 4,
        min_fields: 5,
    };

    /// Returns the layout for a listing command
    #[must_use]
    pub const fn for_command(variant: CommandVariant) -> Self {
        match variant {
            CommandVariant::Netstat => Self::NETSTAT,
            CommandVariant::Ss => Self::SS,
        }
    }
}

/// Rule deciding which connection states are counted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatePolicy {
    /// Count every state except `TIME_WAIT`
    ExcludeTimeWait,
    /// Count only `ESTABLISHED` (`ESTAB` in `ss` output)
    EstablishedOnly,
}

impl StatePolicy {
    /// Policy used when none is configured explicitly
    #[must_use]
    pub const fn default_for(variant: CommandVariant) -> Self {
        match variant {
            CommandVariant::Netstat => Self::ExcludeTimeWait,
            CommandVariant::Ss => Self::EstablishedOnly,
        }
    }

    /// Returns `true` if a connection in `state` is counted.
    ///
    /// Both the `netstat` (`TIME_WAIT`) and `ss` (`TIME-WAIT`) spellings are
    /// recognized.
    #[must_use]
    pub fn counts(self, state: &str) -> bool {
        match self {
            Self::ExcludeTimeWait => !matches!(state, "TIME_WAIT" | "TIME-WAIT"),
            Self::EstablishedOnly => matches!(state, "ESTABLISHED" | "ESTAB"),
        }
    }

    /// Returns the configuration spelling
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ExcludeTimeWait => "exclude-time-wait",
            Self::EstablishedOnly => "established-only",
        }
    }
}

impl fmt::Display for StatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatePolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "exclude-time-wait" => Ok(Self::ExcludeTimeWait),
            "established-only" | "established" => Ok(Self::EstablishedOnly),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

/// One parsed line of listing output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionRecord<'a> {
    /// Raw state token
    pub state: &'a str,
    /// Remote port, `None` when the address has no numeric port (`*`, headers)
    pub remote_port: Option<u16>,
}

impl<'a> ConnectionRecord<'a> {
    /// Extracts a record from one line, or `None` if the line is too short.
    #[must_use]
    pub fn from_line(line: &'a str, layout: ColumnLayout) -> Option<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < layout.min_fields {
            return None;
        }
        let state = *fields.get(layout.state_column)?;
        let remote = *fields.get(layout.remote_column)?;
        Some(Self {
            state,
            remote_port: extract_port(remote),
        })
    }
}

/// Returns the port after the last `:` of an address such as `127.0.0.1:8500`.
///
/// Only the trailing segment is considered, which is correct for IPv4 and
/// bracketed IPv6 (`[::1]:8500`). IPv4-only invocation of the listing command
/// keeps bare IPv6 addresses out of the input.
#[must_use]
pub fn extract_port(address: &str) -> Option<u16> {
    let (_, port) = address.rsplit_once(':')?;
    port.parse().ok()
}

/// Counts connections to one remote port under a [`StatePolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionCounter {
    target_port: u16,
    layout: ColumnLayout,
    policy: StatePolicy,
}

impl ConnectionCounter {
    /// Creates a counter
    #[must_use]
    pub const fn new(target_port: u16, layout: ColumnLayout, policy: StatePolicy) -> Self {
        Self {
            target_port,
            layout,
            policy,
        }
    }

    /// Creates a counter for the configured port, command and policy
    #[must_use]
    pub fn from_config(config: &crate::config::ExporterConfig) -> Self {
        Self::new(config.target_port, config.layout(), config.effective_policy())
    }

    /// Returns `true` if the record targets the port in a counted state
    #[must_use]
    pub fn matches(&self, record: &ConnectionRecord<'_>) -> bool {
        record.remote_port == Some(self.target_port) && self.policy.counts(record.state)
    }

    /// Counts matching lines in raw listing output.
    ///
    /// Short or malformed lines are skipped, never reported as errors.
    #[must_use]
    pub fn count(&self, raw: &str) -> u64 {
        let count = raw
            .lines()
            .filter_map(|line| ConnectionRecord::from_line(line, self.layout))
            .filter(|record| self.matches(record))
            .count();
        count as u64
    }
}

/// Counts lines of `raw` connected to `target_port` in a state `policy` counts.
#[must_use]
pub fn count_connections(
    raw: &str,
    target_port: u16,
    layout: ColumnLayout,
    policy: StatePolicy,
) -> u64 {
    ConnectionCounter::new(target_port, layout, policy).count(raw)
}
