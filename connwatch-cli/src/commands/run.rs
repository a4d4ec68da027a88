//! Long-running exporter command.

use connwatch_core::{CollectorEvent, ExporterConfig, command_exec_factory, start_collector};

use crate::error::CliError;
use crate::util::create_runtime;

/// Run command handler
pub fn cmd_run(config: ExporterConfig) -> Result<(), CliError> {
    let runtime = create_runtime()?;
    runtime.block_on(run_until_shutdown(config))
}

async fn run_until_shutdown(config: ExporterConfig) -> Result<(), CliError> {
    let shutdown = shutdown_signal()?;
    tokio::pin!(shutdown);

    if let Some(path) = config.metrics_file() {
        tracing::info!(path = %path.display(), "Writing metrics to textfile");
    }

    let exec = command_exec_factory(config.command, config.command_timeout);
    let (handle, mut events) = start_collector(config, exec);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            event = events.recv() => match event {
                Some(CollectorEvent::Tick { tally, emitted }) => {
                    tracing::debug!(%tally, emitted, "Tick completed");
                }
                Some(CollectorEvent::Stopped) | None => {
                    tracing::warn!("Collector exited before shutdown was requested");
                    break;
                }
            },
        }
    }

    handle.stop().await;
    Ok(())
}

/// Resolves once Ctrl-C or SIGTERM is received
#[cfg(unix)]
fn shutdown_signal() -> Result<impl std::future::Future<Output = ()>, CliError> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate = signal(SignalKind::terminate())
        .map_err(|e| CliError::Runtime(format!("Failed to install SIGTERM handler: {e}")))?;

    Ok(async move {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
                }
                tracing::info!("Received interrupt, shutting down");
            }
            _ = terminate.recv() => tracing::info!("Received SIGTERM, shutting down"),
        }
    })
}

/// Resolves once Ctrl-C is received
#[cfg(not(unix))]
fn shutdown_signal() -> Result<impl std::future::Future<Output = ()>, CliError> {
    Ok(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
        }
        tracing::info!("Received interrupt, shutting down");
    })
}
