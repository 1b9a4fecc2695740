//! Core abstractions for the edge storefront platform.
//!
//! This crate provides the fundamental types:
//! - `WorkloadManifest` / `RouteConfig` - Workload and route configuration
//! - `RequestContext` - Typed request parameters
//! - `QueryString` - Ordered, replace-on-set query parameters
//! - `TimingContext` - Request lifecycle tracking

mod config;
mod context;
mod lifecycle;
mod query;
mod workload;

pub use config::*;
pub use context::*;
pub use lifecycle::*;
pub use query::*;
pub use workload::*;
