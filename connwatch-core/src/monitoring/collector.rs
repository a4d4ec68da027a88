//! Collector that runs the sample → count → emit pipeline on a timer
//!
//! The collector awaits an exec callback for the raw listing, counts matching
//! connections with a [`ConnectionCounter`], and publishes the [`Tally`]
//! through the exposition emitter. Ticks never overlap: if a tick overruns
//! the interval, the next one is delayed.

use std::future::Future;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::Instrument;

use super::exposition::{self, EmitError};
use super::parser::ConnectionCounter;
use super::sampler::SampleError;
use super::tally::Tally;
use crate::config::{ExporterConfig, format_duration};
use crate::trace_operation;
use crate::tracing::span_names;

/// Capacity of the event channel; events beyond it are dropped
const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Events emitted by the collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectorEvent {
    /// A tick completed
    Tick {
        /// Tally published for this tick
        tally: Tally,
        /// Whether the exposition fragment was written successfully
        emitted: bool,
    },
    /// Collector stopped
    Stopped,
}

/// Handle to control a running collector
#[derive(Debug)]
pub struct CollectorHandle {
    /// Send to stop the collector
    stop_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl CollectorHandle {
    /// Signals the collector to stop and waits for the current tick to finish
    pub async fn stop(self) {
        let _ = self.stop_tx.send(()).await;
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Collector task ended abnormally");
        }
    }

    /// Returns `true` once the collector loop has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

/// Converts one sample result into a tally; failures become `Unavailable`
fn tally_from_sample(
    counter: &ConnectionCounter,
    sample: Result<String, SampleError>,
) -> Tally {
    match sample {
        Ok(output) => Tally::Count(counter.count(&output)),
        Err(e) => {
            tracing::warn!(error = %e, "Connection listing failed, publishing unavailable");
            Tally::Unavailable
        }
    }
}

/// Runs one tick: sample, count, emit
async fn run_tick<F, Fut>(
    config: &ExporterConfig,
    counter: &ConnectionCounter,
    exec_command: &F,
) -> (Tally, Result<(), EmitError>)
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<String, SampleError>>,
{
    let tally = tally_from_sample(counter, exec_command().await);
    if let Some(count) = tally.count() {
        tracing::info!(
            port = config.target_port,
            count,
            "Open IPv4 connections to port {}: {}",
            config.target_port,
            count
        );
    }

    let emitted = exposition::emit(tally, config).await;
    if let Err(ref e) = emitted {
        tracing::warn!(error = %e, "Failed to publish metrics");
    }
    (tally, emitted)
}

/// Starts the collection loop.
///
/// The `exec_command` callback runs the listing tool once and returns its
/// output; [`super::command_exec_factory`] provides the real one. The first
/// tick runs immediately, then every `config.poll_interval`.
///
/// Returns a handle to stop the collector and a receiver for events. Dropping
/// the handle also stops the loop; dropping the receiver does not.
pub fn start_collector<F, Fut>(
    config: ExporterConfig,
    exec_command: F,
) -> (CollectorHandle, mpsc::Receiver<CollectorEvent>)
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, SampleError>> + Send,
{
    let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
    let (event_tx, event_rx) = mpsc::channel::<CollectorEvent>(EVENT_CHANNEL_CAPACITY);

    let counter = ConnectionCounter::from_config(&config);

    tracing::info!(
        port = config.target_port,
        interval = %format_duration(config.poll_interval),
        command = %config.command,
        policy = %config.effective_policy(),
        "Starting TCP connection exporter"
    );

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = stop_rx.recv() => break,
                _ = ticker.tick() => {
                    let span = trace_operation!(
                        span_names::COLLECTOR_TICK,
                        port = config.target_port
                    );
                    let (tally, emitted) = run_tick(&config, &counter, &exec_command)
                        .instrument(span)
                        .await;
                    let _ = event_tx.try_send(CollectorEvent::Tick {
                        tally,
                        emitted: emitted.is_ok(),
                    });
                }
            }
        }

        tracing::info!("Collector stopped");
        let _ = event_tx.try_send(CollectorEvent::Stopped);
    });

    (CollectorHandle { stop_tx, task }, event_rx)
}

/// Samples and counts once without any fallback.
///
/// Used by one-shot mode, where a failed listing is fatal rather than being
/// published as unavailable.
///
/// # Errors
///
/// Returns the [`SampleError`] from the exec callback.
pub async fn collect_once<F, Fut>(config: &ExporterConfig, exec_command: F) -> Result<Tally, SampleError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, SampleError>>,
{
    let output = exec_command()
        .instrument(trace_operation!(span_names::SAMPLE, port = config.target_port))
        .await?;
    let count = ConnectionCounter::from_config(config).count(&output);
    tracing::debug!(port = config.target_port, count, host = %config.host, "Counted connections");
    Ok(Tally::Count(count))
}
