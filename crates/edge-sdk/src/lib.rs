//! Public SDK for edge storefront workloads.
//!
//! Re-exports the platform crates so a workload depends on one crate:
//!
//! ```ignore
//! use edge_sdk::prelude::*;
//!
//! let ctx = RequestContext::new(Method::Get, "/products/silk-dress?Size=M");
//! let logger = StructuredLogger::new(ctx.request_id.clone());
//! logger.info("rendering product").field("path", &ctx.path).emit();
//!
//! let mut sink = StreamingSink::new(body, ctx.timing);
//! sink.send_shell(&shell.render_opening()).await?;
//! sink.send_section("product-information", &html).await?;
//! sink.finish(&shell.render_closing()).await?;
//! ```

pub use edge_core;
pub use edge_data;
pub use edge_observability;
pub use edge_security;
pub use edge_streaming;

/// Prelude for convenient imports.
pub mod prelude {
    pub use edge_core::*;
    pub use edge_data::*;
    pub use edge_observability::*;
    pub use edge_security::*;
    pub use edge_streaming::*;
}
