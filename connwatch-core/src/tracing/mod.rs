//! Tracing integration for structured logging
//!
//! This module initializes the `tracing` subscriber used by the exporter and
//! defines the span names emitted around sampling and publishing.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Global flag indicating whether tracing has been initialized
static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Environment variable holding a filter directive that overrides the level
pub const LOG_FILTER_ENV: &str = "CONNWATCH_LOG";

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to initialize tracing subscriber
    #[error("Failed to initialize tracing: {0}")]
    InitializationFailed(String),

    /// Tracing already initialized
    #[error("Tracing has already been initialized")]
    AlreadyInitialized,
}

/// Result type for tracing operations
pub type TracingResult<T> = Result<T, TracingError>;

/// Tracing log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TracingLevel {
    /// Error level - only errors
    Error,
    /// Warn level - errors and warnings
    Warn,
    /// Info level - errors, warnings, and info (default)
    #[default]
    Info,
    /// Debug level - all above plus debug messages
    Debug,
    /// Trace level - all messages including trace
    Trace,
}

impl TracingLevel {
    /// Maps a `-v` count onto a level; `quiet` wins over any count
    #[must_use]
    pub const fn from_verbosity(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Error;
        }
        match verbose {
            0 => Self::Info,
            1 => Self::Debug,
            _ => Self::Trace,
        }
    }
}

impl std::fmt::Display for TracingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Configuration for tracing initialization.
///
/// Logs always go to stderr; stdout stays free for one-shot exposition output.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Log level
    pub level: TracingLevel,
    /// Custom filter string (overrides level if set)
    pub filter: Option<String>,
    /// ANSI colors on stderr
    pub ansi: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: TracingLevel::default(),
            filter: None,
            ansi: true,
        }
    }
}

impl TracingConfig {
    /// Creates a new tracing configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables ANSI colors
    #[must_use]
    pub const fn with_ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    /// Sets the log level
    #[must_use]
    pub const fn with_level(mut self, level: TracingLevel) -> Self {
        self.level = level;
        self
    }

    /// Sets a custom filter string
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Applies [`LOG_FILTER_ENV`] as the filter when it is set and non-empty
    #[must_use]
    pub fn with_env_filter(self) -> Self {
        match std::env::var(LOG_FILTER_ENV) {
            Ok(filter) if !filter.trim().is_empty() => self.with_filter(filter),
            _ => self,
        }
    }

    /// Filter directive used when no custom filter is set
    #[must_use]
    pub fn default_directive(&self) -> String {
        format!("connwatch={0},connwatch_core={0}", self.level)
    }
}

/// Initializes the stderr tracing subscriber with the given configuration
///
/// This function should be called once at application startup.
/// Subsequent calls will return an error.
///
/// # Errors
///
/// Returns an error if:
/// - Tracing has already been initialized
/// - The custom filter is not a valid directive
/// - The subscriber fails to initialize
pub fn init_tracing(config: &TracingConfig) -> TracingResult<()> {
    if TRACING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(TracingError::AlreadyInitialized);
    }

    let filter = if let Some(ref custom_filter) = config.filter {
        EnvFilter::try_new(custom_filter)
            .map_err(|e| TracingError::InitializationFailed(e.to_string()))?
    } else {
        EnvFilter::try_new(config.default_directive()).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_ansi(config.ansi)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| TracingError::InitializationFailed(e.to_string()))?;

    tracing::debug!(level = %config.level, "Tracing initialized");

    Ok(())
}

/// Macro for creating operation spans with standard fields
///
/// # Examples
///
/// ```ignore
/// use connwatch_core::trace_operation;
///
/// let _span = trace_operation!("collector.tick", port = 8500);
/// ```
#[macro_export]
macro_rules! trace_operation {
    ($name:expr) => {
        tracing::info_span!($name)
    };
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Standard span names for `connwatch` operations
pub mod span_names {
    /// One sample → count → emit cycle of the daemon loop
    pub const COLLECTOR_TICK: &str = "collector.tick";
    /// Single run of the listing command
    pub const SAMPLE: &str = "sampler.sample";
}
