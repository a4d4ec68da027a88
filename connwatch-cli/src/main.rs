//! `connwatch` - TCP connection-count exporter for Prometheus
//!
//! Counts the TCP connections to one remote port and publishes the result
//! as a gauge, either to a textfile-collector file on a timer or once to
//! stdout.

mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use cli::Cli;
use connwatch_core::{TracingConfig, TracingLevel, init_tracing};

use crate::error::exit_codes;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // --help and --version are reported through clap as well
            let code = if e.use_stderr() {
                exit_codes::GENERAL_ERROR
            } else {
                0
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let tracing_config = TracingConfig::new()
        .with_level(TracingLevel::from_verbosity(cli.verbose, cli.quiet))
        .with_ansi(!cli.no_color)
        .with_env_filter();
    if let Err(e) = init_tracing(&tracing_config) {
        eprintln!("Warning: {e}");
    }

    if let Err(e) = commands::dispatch(cli.command) {
        tracing::debug!(error = %e, exit_code = e.exit_code(), "Command failed");
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
