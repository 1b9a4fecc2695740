//! Newtype IDs for storefront global IDs.
//!
//! The storefront API identifies resources with global IDs such as
//! `gid://shopify/ProductVariant/4242`. Keeping product and variant IDs as
//! distinct types stops one from being passed where the other is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! define_id {
    ($name:ident, $resource:literal) => {
        #[doc = concat!("Global ID of a `", $resource, "`.")]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Build the global ID from a numeric resource ID.
            pub fn from_legacy(id: u64) -> Self {
                Self(format!("gid://shopify/{}/{}", $resource, id))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// The numeric resource ID at the end of the global ID.
            ///
            /// Plain numeric IDs are returned as-is.
            pub fn legacy_id(&self) -> Option<u64> {
                let tail = self.0.rsplit('/').next()?;
                let tail = tail.split('?').next()?;
                tail.parse().ok()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(ProductId, "Product");
define_id!(VariantId, "ProductVariant");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_id() {
        assert_eq!(ProductId::new("gid://shopify/Product/7981").legacy_id(), Some(7981));
        assert_eq!(ProductId::new("7981").legacy_id(), Some(7981));
        assert_eq!(ProductId::new("gid://shopify/Product/abc").legacy_id(), None);
    }

    #[test]
    fn test_from_legacy_round_trip() {
        let id = VariantId::from_legacy(12);
        assert_eq!(id.as_str(), "gid://shopify/ProductVariant/12");
        assert_eq!(id.legacy_id(), Some(12));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let json = serde_json::to_string(&VariantId::new("gid://shopify/ProductVariant/1")).unwrap();
        assert_eq!(json, r#""gid://shopify/ProductVariant/1""#);
    }
}
