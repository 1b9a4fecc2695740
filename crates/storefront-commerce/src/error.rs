//! Commerce error types.

use edge_data::FetchError;
use thiserror::Error;

/// Errors from loading or interpreting storefront data.
#[derive(Error, Debug)]
pub enum CommerceError {
    /// No product exists for the handle.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The GraphQL endpoint answered with errors.
    #[error("Storefront query failed: {}", .0.join("; "))]
    GraphQl(Vec<String>),

    /// A money amount could not be parsed.
    #[error("Invalid money amount: {0}")]
    InvalidMoney(String),

    /// A response did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request never produced a usable response.
    #[error(transparent)]
    Fetch(#[from] FetchError),
}

/// Result type for commerce operations.
pub type CommerceResult<T> = Result<T, CommerceError>;

impl CommerceError {
    /// Whether the error means "render a 404" rather than "render a 500".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProductNotFound(_))
    }
}
