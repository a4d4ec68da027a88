//! Command handler modules for the CLI.

mod completions;
mod config;
mod once;
mod run;

use crate::cli::Commands;
use crate::error::CliError;
use crate::util::{resolve_daemon_config, resolve_once_config};

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Run { exporter, daemon } => run::cmd_run(resolve_daemon_config(&exporter, &daemon)?),
        Commands::Once { exporter, host } => {
            once::cmd_once(&resolve_once_config(&exporter, host.as_deref())?)
        }
        Commands::Config {
            format,
            exporter,
            daemon,
        } => config::cmd_config(&resolve_daemon_config(&exporter, &daemon)?, format),
        Commands::Completions { shell } => completions::cmd_completions(shell),
    }
}
