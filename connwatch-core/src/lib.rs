//! `connwatch` Core Library
//!
//! This crate samples the local TCP connection table, counts connections to a
//! configured remote port, and publishes the result as a Prometheus gauge.
//!
//! # Crate Structure
//!
//! - [`config`] - Immutable exporter configuration loaded from the environment
//! - [`monitoring`] - Sampler, parser/counter, exposition emitter and the
//!   polling collector
//! - [`tracing`] - Structured logging initialization
//! - [`error`] - Crate-level error type

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod monitoring;
pub mod tracing;

pub use config::{ConfigError, ConfigSummary, ExporterConfig, OutputTarget};
pub use error::ConnwatchError;
pub use monitoring::{
    CollectorEvent, CollectorHandle, ColumnLayout, CommandVariant, ConnectionCounter,
    ConnectionRecord, EmitError, MetricStyle, Sampler, SampleError, StatePolicy, Tally,
    collect_once, command_exec_factory, start_collector,
};
pub use tracing::{TracingConfig, TracingError, TracingLevel, init_tracing, span_names};
