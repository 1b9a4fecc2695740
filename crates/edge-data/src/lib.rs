//! Data access layer with dependency tagging and outbound allowlisting.
//!
//! This crate provides:
//! - `FetchClient` - Platform fetch with allowlist checks and retries
//! - `OutboundRequest` / `Response` - Transport-neutral request and response
//! - `HttpTransport` - The seam between the client and the host runtime
//! - `DependencyTag` - Semantic dependency categories
//! - `RetryPolicy` - Retry conditions

mod client;
mod dependency;
mod error;
mod request;
mod response;
mod retry;
mod transport;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use client::*;
pub use dependency::*;
pub use error::*;
pub use request::*;
pub use response::*;
pub use retry::*;
pub use transport::*;
