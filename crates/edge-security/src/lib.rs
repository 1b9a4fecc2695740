//! Security infrastructure for the edge storefront platform.
//!
//! This crate provides:
//! - `ContentSecurityPolicy` - Per-request CSP assembly with a script nonce
//! - `CspDirectives` - Order-preserving, duplicate-free directive sets
//! - `OutboundAllowlist` - Pattern-based host filtering for outbound requests
//!
//! # Example
//!
//! ```ignore
//! use edge_security::{ContentSecurityPolicy, CspDirectives, CspMode, Nonce};
//!
//! let mut extra = CspDirectives::new();
//! extra.add_sources("connect-src", ["https://queue.fal.run"]);
//!
//! let csp = ContentSecurityPolicy::builder()
//!     .with_directives(CspDirectives::storefront_defaults())
//!     .with_directives(extra)
//!     .nonce(Nonce::generate())
//!     .mode(CspMode::ReportOnly)
//!     .build();
//!
//! let (name, value) = (csp.header_name(), csp.header_value());
//! ```

mod allowlist;
mod csp;

pub use allowlist::*;
pub use csp::*;
