//! Shared utility functions used across command modules.

use connwatch_core::{ExporterConfig, OutputTarget};

use crate::cli::{DaemonArgs, ExporterArgs};
use crate::error::CliError;

/// Applies sampling flags on top of an environment-derived configuration
pub fn apply_exporter_args(mut config: ExporterConfig, args: &ExporterArgs) -> ExporterConfig {
    if let Some(port) = args.port {
        config = config.with_target_port(port);
    }
    if let Some(command) = args.command {
        config = config.with_command(command.into());
    }
    if let Some(policy) = args.policy {
        config = config.with_policy(policy.into());
    }
    if let Some(name) = &args.metric_name {
        config = config.with_metric_name(name.clone());
    }
    if let Some(style) = args.metric_style {
        config = config.with_metric_style(style.into());
    }
    if let Some(timeout) = args.command_timeout {
        config = config.with_command_timeout(timeout);
    }
    config
}

/// Applies daemon flags on top of a configuration
pub fn apply_daemon_args(mut config: ExporterConfig, args: &DaemonArgs) -> ExporterConfig {
    if let Some(interval) = args.interval {
        config = config.with_poll_interval(interval);
    }
    if let Some(path) = &args.output_file {
        config = config.with_output(OutputTarget::File(path.clone()));
    }
    config
}

/// Resolves the daemon configuration: environment, then flags.
pub fn resolve_daemon_config(
    exporter: &ExporterArgs,
    daemon: &DaemonArgs,
) -> Result<ExporterConfig, CliError> {
    let config = apply_exporter_args(ExporterConfig::from_env(), exporter);
    let config = apply_daemon_args(config, daemon);
    config.validate()?;
    Ok(config)
}

/// Resolves the one-shot configuration; output always goes to stdout.
pub fn resolve_once_config(
    exporter: &ExporterArgs,
    host: Option<&str>,
) -> Result<ExporterConfig, CliError> {
    let mut config =
        apply_exporter_args(ExporterConfig::from_env(), exporter).with_output(OutputTarget::Stdout);
    if let Some(host) = host {
        config = config.with_host(host);
    }
    config.validate()?;
    Ok(config)
}

/// Creates the tokio runtime used by sampling commands
pub fn create_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Runtime(format!("Failed to create async runtime: {e}")))
}
