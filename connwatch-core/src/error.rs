//! Crate-level error type
//!
//! Each module owns a focused error enum; [`ConnwatchError`] wraps them so
//! callers that drive several stages (the CLI) can use a single `?` chain.

use thiserror::Error;

use crate::config::ConfigError;
use crate::monitoring::{EmitError, SampleError};
use crate::tracing::TracingError;

/// Errors surfaced by the `connwatch` core library
#[derive(Debug, Error)]
pub enum ConnwatchError {
    /// Invalid configuration value
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The connection-listing command could not be run
    #[error(transparent)]
    Sample(#[from] SampleError),

    /// The metrics artifact could not be written
    #[error(transparent)]
    Emit(#[from] EmitError),

    /// Logging could not be initialized
    #[error(transparent)]
    Tracing(#[from] TracingError),
}
