//! CLI argument parsing types using `clap`.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use connwatch_core::config::{parse_duration, parse_port};
use connwatch_core::monitoring::exposition::is_valid_metric_name;
use connwatch_core::{CommandVariant, MetricStyle, StatePolicy};

/// `connwatch` exports the number of TCP connections to one port as a
/// Prometheus gauge
#[derive(Parser)]
#[command(name = "connwatch")]
#[command(author, version, about = "TCP connection-count exporter for Prometheus")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Sample on a timer and rewrite the metrics file every tick
    #[command(about = "Run the exporter until interrupted")]
    Run {
        #[command(flatten)]
        exporter: ExporterArgs,

        #[command(flatten)]
        daemon: DaemonArgs,
    },

    /// Sample once and print the exposition fragment to stdout
    #[command(about = "Count connections once and print the metric")]
    Once {
        #[command(flatten)]
        exporter: ExporterArgs,

        /// Host the port belongs to (informational, logged only)
        #[arg(long, value_name = "HOST")]
        host: Option<String>,
    },

    /// Print the configuration resolved from environment and flags
    #[command(about = "Show the resolved configuration")]
    Config {
        /// Output format
        #[arg(short, long, default_value = "toml", value_enum)]
        format: ConfigFormat,

        #[command(flatten)]
        exporter: ExporterArgs,

        #[command(flatten)]
        daemon: DaemonArgs,
    },

    /// Generate shell completions
    #[command(about = "Generate shell completion scripts")]
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Options shared by every sampling command
#[derive(Args, Debug, Clone, Default)]
pub struct ExporterArgs {
    /// Remote port whose connections are counted [default: $CONSUL_PORT or 8500]
    #[arg(short, long, value_parser = port_arg)]
    pub port: Option<u16>,

    /// Connection-listing tool [default: $CONNWATCH_COMMAND or netstat]
    #[arg(short, long, value_enum)]
    pub command: Option<CommandArg>,

    /// Which connection states are counted [default: depends on --command]
    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Metric base name [default: $CONNWATCH_METRIC_NAME or tcp_connections]
    #[arg(long, value_name = "NAME", value_parser = metric_name_arg)]
    pub metric_name: Option<String>,

    /// Put the port in a label or in the metric name
    #[arg(long, value_enum)]
    pub metric_style: Option<MetricStyleArg>,

    /// Upper bound for one run of the listing tool (e.g. 10s)
    #[arg(long, value_name = "DURATION", value_parser = duration_arg)]
    pub command_timeout: Option<Duration>,
}

/// Options of the long-running exporter
#[derive(Args, Debug, Clone, Default)]
pub struct DaemonArgs {
    /// Delay between samples, e.g. 1s, 500ms, 1m30s [default: $UPDATE_DELAY or 1s]
    #[arg(short, long, value_name = "DURATION", value_parser = interval_arg)]
    pub interval: Option<Duration>,

    /// Textfile-collector output path [default: $METRICS_FILE]
    #[arg(short, long, value_name = "PATH")]
    pub output_file: Option<PathBuf>,
}

/// Connection-listing tool
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum CommandArg {
    /// `netstat -t -a -n --inet`
    Netstat,
    /// `ss -t -a -n -4`
    Ss,
}

impl From<CommandArg> for CommandVariant {
    fn from(arg: CommandArg) -> Self {
        match arg {
            CommandArg::Netstat => Self::Netstat,
            CommandArg::Ss => Self::Ss,
        }
    }
}

/// Counted-state policy
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Every state except `TIME_WAIT`
    ExcludeTimeWait,
    /// Only `ESTABLISHED`
    EstablishedOnly,
}

impl From<PolicyArg> for StatePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::ExcludeTimeWait => Self::ExcludeTimeWait,
            PolicyArg::EstablishedOnly => Self::EstablishedOnly,
        }
    }
}

/// Placement of the port in the sample line
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum MetricStyleArg {
    /// `tcp_connections{port="8500"} 3`
    PortLabel,
    /// `tcp_connections_8500 3`
    PortInName,
}

impl From<MetricStyleArg> for MetricStyle {
    fn from(arg: MetricStyleArg) -> Self {
        match arg {
            MetricStyleArg::PortLabel => Self::PortLabel,
            MetricStyleArg::PortInName => Self::PortInName,
        }
    }
}

/// Output format for `config`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML document
    #[default]
    Toml,
    /// Pretty-printed JSON
    Json,
}

fn port_arg(s: &str) -> Result<u16, String> {
    parse_port(s).map_err(|e| e.to_string())
}

fn duration_arg(s: &str) -> Result<Duration, String> {
    parse_duration(s).map_err(|e| e.to_string())
}

fn interval_arg(s: &str) -> Result<Duration, String> {
    let interval = duration_arg(s)?;
    if interval.is_zero() {
        return Err("interval must be greater than zero".to_string());
    }
    Ok(interval)
}

fn metric_name_arg(s: &str) -> Result<String, String> {
    if is_valid_metric_name(s) {
        Ok(s.to_string())
    } else {
        Err(format!("'{s}' is not a valid Prometheus metric name"))
    }
}
