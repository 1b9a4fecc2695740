//! Storefront product page with virtual try-on.
//!
//! Routes:
//! - `GET /products/:handle` streams the product page (buffered for bots)
//! - `POST /api/try-on` queues a try-on job for the uploaded photo
//! - `GET /api/try-on/:request_id` reports job status and the result image
//! - `DELETE /api/try-on/:request_id` cancels a job

pub mod api;
pub mod bot;
pub mod config;
pub mod csp;
pub mod page;
pub mod sections;

#[cfg(target_arch = "wasm32")]
mod component;

use edge_sdk::edge_core::{RouteConfig, WorkloadManifest};
use edge_sdk::edge_security::OutboundAllowlist;
use storefront_commerce::judgeme::JUDGEME_API_BASE;
use storefront_tryon::DEFAULT_QUEUE_URL;

use config::StorefrontConfig;

pub const WORKLOAD_NAME: &str = "storefront-pdp";

/// Route handler names.
pub mod handler {
    pub const PRODUCT: &str = "product";
    pub const TRY_ON_SUBMIT: &str = "try_on_submit";
    pub const TRY_ON_STATUS: &str = "try_on_status";
    pub const TRY_ON_CANCEL: &str = "try_on_cancel";
}

pub fn manifest() -> WorkloadManifest {
    WorkloadManifest::new(WORKLOAD_NAME, env!("CARGO_PKG_VERSION"))
        .with_route(RouteConfig::new("/products/:handle", handler::PRODUCT))
        .with_route(
            RouteConfig::new("/api/try-on", handler::TRY_ON_SUBMIT).with_methods(vec!["POST"]),
        )
        .with_route(RouteConfig::new("/api/try-on/:request_id", handler::TRY_ON_STATUS))
        .with_route(
            RouteConfig::new("/api/try-on/:request_id", handler::TRY_ON_CANCEL)
                .with_methods(vec!["DELETE"]),
        )
}

/// Hosts the workload may call: the store, the reviews provider and the
/// inference queue.
pub fn outbound_allowlist(config: &StorefrontConfig) -> OutboundAllowlist {
    OutboundAllowlist::new().allow_hosts([
        config.store_domain.as_str(),
        host_of(JUDGEME_API_BASE),
        host_of(DEFAULT_QUEUE_URL),
    ])
}

fn host_of(url: &str) -> &str {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split('/').next().unwrap_or(rest)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};
    use storefront_commerce::{
        Currency, Money, Product, ProductId, ProductOption, ProductVariant, SelectedOption, Shop,
        ShopPolicy, VariantId,
    };

    use crate::config::StorefrontConfig;

    pub fn config() -> StorefrontConfig {
        StorefrontConfig::from_lookup(|name| {
            let value = match name {
                "store_domain" => "atelier.myshopify.com",
                "storefront_api_token" => "storefront-token",
                "judgeme_api_token" => "judgeme-token",
                "fal_key" => "fal-secret",
                _ => return None,
            };
            Some(value.to_string())
        })
        .unwrap()
    }

    fn variant(id: u64, color: &str, size: &str, available: bool) -> ProductVariant {
        ProductVariant {
            id: VariantId::from_legacy(id),
            title: format!("{} / {}", color, size),
            available_for_sale: available,
            quantity_available: Some(if available { 3 } else { 0 }),
            price: Money::new(8000, Currency::USD),
            compare_at_price: None,
            selected_options: vec![
                SelectedOption::new("Color", color),
                SelectedOption::new("Size", size),
            ],
            image: None,
            sku: None,
        }
    }

    pub fn product() -> Product {
        Product {
            id: ProductId::from_legacy(1),
            handle: "silk-dress".to_string(),
            title: "Silk Dress".to_string(),
            vendor: "Atelier".to_string(),
            summary: "A silk dress.".to_string(),
            description: "<p>A silk dress.</p>".to_string(),
            published_at: None,
            options: vec![
                ProductOption {
                    name: "Color".to_string(),
                    values: vec!["Red".to_string(), "Blue".to_string()],
                },
                ProductOption {
                    name: "Size".to_string(),
                    values: vec!["S".to_string(), "M".to_string()],
                },
            ],
            selected_variant: None,
            media: Vec::new(),
            variants: vec![
                variant(11, "Red", "S", true),
                variant(12, "Red", "M", true),
                variant(13, "Blue", "S", false),
                variant(14, "Blue", "M", true),
            ],
        }
    }

    pub fn shop() -> Shop {
        Shop {
            name: "Atelier".to_string(),
            shipping_policy: Some(ShopPolicy {
                handle: "shipping-policy".to_string(),
                title: "Shipping".to_string(),
                body: "<h2>Shipping</h2><p>Ships in 2 days.</p><p>Tracked delivery.</p>"
                    .to_string(),
            }),
            refund_policy: Some(ShopPolicy {
                handle: "refund-policy".to_string(),
                title: "Refunds".to_string(),
                body: "<p>Returns within 30 days.</p>".to_string(),
            }),
        }
    }

    fn variant_json(id: u64, color: &str, size: &str, available: bool) -> Value {
        json!({
            "id": format!("gid://shopify/ProductVariant/{}", id),
            "title": format!("{} / {}", color, size),
            "availableForSale": available,
            "quantityAvailable": if available { 3 } else { 0 },
            "selectedOptions": [
                {"name": "Color", "value": color},
                {"name": "Size", "value": size}
            ],
            "price": {"amount": "80.0", "currencyCode": "USD"},
            "compareAtPrice": null
        })
    }

    /// Storefront reply to the product query.
    pub fn product_response() -> Value {
        json!({
            "data": {
                "product": {
                    "id": "gid://shopify/Product/1",
                    "handle": "silk-dress",
                    "title": "Silk Dress",
                    "vendor": "Atelier",
                    "summary": "A silk dress.",
                    "description": "<p>A silk dress.</p>",
                    "publishedAt": "2025-01-10T09:00:00Z",
                    "options": [
                        {"name": "Color", "values": ["Red", "Blue"]},
                        {"name": "Size", "values": ["S", "M"]}
                    ],
                    "selectedVariant": variant_json(14, "Blue", "M", true),
                    "media": {"nodes": [
                        {"id": "m1", "image": {"url": "https://cdn.shopify.com/dress.jpg", "altText": "Silk dress"}}
                    ]}
                },
                "shop": {
                    "name": "Atelier",
                    "shippingPolicy": {"handle": "shipping-policy", "title": "Shipping", "body": "<p>Ships in 2 days.</p>"},
                    "refundPolicy": null
                }
            }
        })
    }

    /// Storefront reply to the variants query.
    pub fn variants_response() -> Value {
        json!({
            "data": {"product": {"variants": {"nodes": [
                variant_json(11, "Red", "S", true),
                variant_json(12, "Red", "M", true),
                variant_json(13, "Blue", "S", false),
                variant_json(14, "Blue", "M", true)
            ]}}}
        })
    }

    /// Judge.me reply with `count` published reviews.
    pub fn reviews_response(count: usize) -> Value {
        let reviews: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "id": i,
                    "rating": 5,
                    "title": format!("Review {}", i),
                    "body": "Fits well",
                    "created_at": "2026-09-01T08:00:00+00:00",
                    "reviewer": {"id": i, "name": "Ana", "email": null},
                    "published": true,
                    "hidden": false
                })
            })
            .collect();
        json!({ "reviews": reviews })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_sdk::edge_core::{Method, WorkloadError};

    #[test]
    fn test_routes_resolve() {
        let manifest = manifest();

        let product = manifest.resolve(Method::Get, "/products/silk-dress").unwrap();
        assert_eq!(product.handler, handler::PRODUCT);
        assert_eq!(product.params.get("handle").map(String::as_str), Some("silk-dress"));

        let submit = manifest.resolve(Method::Post, "/api/try-on").unwrap();
        assert_eq!(submit.handler, handler::TRY_ON_SUBMIT);

        let status = manifest.resolve(Method::Get, "/api/try-on/abc-1").unwrap();
        assert_eq!(status.handler, handler::TRY_ON_STATUS);

        let cancel = manifest.resolve(Method::Delete, "/api/try-on/abc-1").unwrap();
        assert_eq!(cancel.handler, handler::TRY_ON_CANCEL);
        assert_eq!(cancel.params.get("request_id").map(String::as_str), Some("abc-1"));
    }

    #[test]
    fn test_unknown_routes() {
        let manifest = manifest();
        assert!(matches!(
            manifest.resolve(Method::Get, "/collections/all"),
            Err(WorkloadError::NotFound(_))
        ));
        assert!(matches!(
            manifest.resolve(Method::Get, "/api/try-on"),
            Err(WorkloadError::MethodNotAllowed(_))
        ));
    }

    #[test]
    fn test_allowlist_covers_dependencies() {
        let allowlist = outbound_allowlist(&fixtures::config());
        assert!(allowlist
            .check_url("https://atelier.myshopify.com/api/2024-10/graphql.json")
            .is_ok());
        assert!(allowlist.check_url("https://judge.me/api/v1/reviews").is_ok());
        assert!(allowlist.check_url("https://queue.fal.run/fashn/tryon").is_ok());
        assert!(allowlist.check_url("https://evil.example.com/").is_err());
    }
}
