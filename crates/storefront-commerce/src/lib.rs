//! Storefront domain types and loaders.
//!
//! - Catalog projections of the storefront API (`Product`, `ProductVariant`, `Shop`)
//! - `Money` parsed from decimal strings into minor units
//! - `VariantSelection` with URL query synchronisation
//! - Review pagination and the Judge.me loader
//! - The storefront GraphQL client

pub mod catalog;
pub mod display;
pub mod error;
pub mod ids;
pub mod judgeme;
pub mod money;
pub mod reviews;
pub mod selection;
pub mod storefront;

pub use catalog::*;
pub use display::*;
pub use error::{CommerceError, CommerceResult};
pub use ids::*;
pub use judgeme::JudgemeClient;
pub use money::{Currency, Money};
pub use reviews::*;
pub use selection::*;
pub use storefront::{ProductPage, StorefrontClient};
