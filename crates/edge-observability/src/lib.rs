//! Logging and counters for the decision function and renderer.
//!
//! This crate provides:
//! - `init_logging` - `tracing` subscriber in JSON or human format
//! - `DecisionMetrics` - per-instance request and render counters

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;

pub use edge_core::RequestId;
