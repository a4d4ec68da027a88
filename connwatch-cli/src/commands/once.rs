//! One-shot sampling command.

use connwatch_core::monitoring::exposition;
use connwatch_core::{ExporterConfig, collect_once, command_exec_factory};

use crate::error::CliError;
use crate::util::create_runtime;

/// Once command handler.
///
/// A failed listing is returned as [`CliError::CommandFailed`] instead of
/// being published as unavailable.
pub fn cmd_once(config: &ExporterConfig) -> Result<(), CliError> {
    let runtime = create_runtime()?;
    let exec = command_exec_factory(config.command, config.command_timeout);

    runtime.block_on(async {
        let tally = collect_once(config, exec).await?;
        tracing::info!(
            host = %config.host,
            port = config.target_port,
            %tally,
            "Open IPv4 connections to port {}: {}",
            config.target_port,
            tally
        );

        exposition::emit(tally, config).await?;
        Ok::<(), CliError>(())
    })
}
