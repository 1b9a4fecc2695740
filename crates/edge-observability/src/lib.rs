//! Observability for edge storefront workloads.
//!
//! This crate provides:
//! - `StructuredLogger` - Request-scoped structured logging to stderr
//! - `MetricsCollector` - Shell, section and dependency timings per request

mod logging;
mod metrics;

pub use logging::*;
pub use metrics::*;

pub use edge_core::RequestId;
