//! CLI error types and exit codes.

use connwatch_core::{ConfigError, ConnwatchError, EmitError, SampleError, TracingError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, IO, runtime or usage errors
    pub const GENERAL_ERROR: i32 = 1;
    /// The connection-listing tool failed in one-shot mode
    pub const COMMAND_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Listing tool could not be run
    #[error("Connection listing failed: {0}")]
    CommandFailed(String),

    /// Metrics could not be published
    #[error("Output error: {0}")]
    Emit(String),

    /// Async runtime or signal setup failed
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// Configuration could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConnwatchError> for CliError {
    fn from(err: ConnwatchError) -> Self {
        match err {
            ConnwatchError::Config(e) => Self::Config(e.to_string()),
            ConnwatchError::Sample(e) => Self::CommandFailed(e.to_string()),
            ConnwatchError::Emit(e) => Self::Emit(e.to_string()),
            ConnwatchError::Tracing(e) => Self::Runtime(e.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        ConnwatchError::from(err).into()
    }
}

impl From<SampleError> for CliError {
    fn from(err: SampleError) -> Self {
        ConnwatchError::from(err).into()
    }
}

impl From<EmitError> for CliError {
    fn from(err: EmitError) -> Self {
        ConnwatchError::from(err).into()
    }
}

impl From<TracingError> for CliError {
    fn from(err: TracingError) -> Self {
        ConnwatchError::from(err).into()
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, output, runtime, IO)
    /// - 2: The listing tool failed in one-shot mode
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::CommandFailed(_) => exit_codes::COMMAND_FAILURE,
            Self::Config(_)
            | Self::Emit(_)
            | Self::Runtime(_)
            | Self::Serialize(_)
            | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
