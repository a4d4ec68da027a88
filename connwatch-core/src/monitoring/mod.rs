//! TCP connection monitoring
//!
//! Samples the local connection table with `netstat` or `ss`, counts the
//! connections to one remote port, and publishes the tally as a Prometheus
//! gauge. Every tick is independent: sample → count → emit, nothing carried
//! over.

pub mod collector;
pub mod exposition;
pub mod parser;
pub mod sampler;
mod tally;

pub use collector::{CollectorEvent, CollectorHandle, collect_once, start_collector};
pub use exposition::{EmitError, MetricStyle};
pub use parser::{
    ColumnLayout, ConnectionCounter, ConnectionRecord, StatePolicy, count_connections,
    extract_port,
};
pub use sampler::{CommandVariant, ExecFuture, SampleError, Sampler, command_exec_factory};
pub use tally::Tally;
