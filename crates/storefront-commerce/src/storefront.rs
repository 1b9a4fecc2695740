//! Storefront GraphQL client.

use edge_data::{DependencyTag, FetchClient, HttpTransport, OutboundRequest};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::catalog::{Product, ProductVariant, SelectedOption, Shop};
use crate::error::{CommerceError, CommerceResult};

const PRODUCT_VARIANT_FRAGMENT: &str = r#"
fragment ProductVariant on ProductVariant {
  id
  title
  availableForSale
  quantityAvailable
  sku
  selectedOptions { name value }
  image { url altText width height }
  price { amount currencyCode }
  compareAtPrice { amount currencyCode }
}
"#;

/// Product, its variant for the requested options, and the shop policies.
pub const PRODUCT_QUERY: &str = r#"
query Product($handle: String!, $selectedOptions: [SelectedOptionInput!]!) {
  product(handle: $handle) {
    id
    handle
    title
    vendor
    summary: description
    description: descriptionHtml
    publishedAt
    options { name values }
    selectedVariant: variantBySelectedOptions(
      selectedOptions: $selectedOptions
      ignoreUnknownOptions: true
      caseInsensitiveMatch: true
    ) {
      ...ProductVariant
    }
    media(first: 7) {
      nodes {
        ... on MediaImage { id alt image { url altText width height } }
      }
    }
  }
  shop {
    name
    shippingPolicy { handle title body }
    refundPolicy { handle title body }
  }
}
"#;

/// Every variant of a product.
pub const VARIANTS_QUERY: &str = r#"
query ProductVariants($handle: String!) {
  product(handle: $handle) {
    variants(first: 250) {
      nodes { ...ProductVariant }
    }
  }
}
"#;

/// Data needed to render a product page.
#[derive(Debug, Clone)]
pub struct ProductPage {
    pub product: Product,
    pub shop: Shop,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse<D> {
    data: Option<D>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ProductQueryData {
    product: Option<Product>,
    shop: Shop,
}

#[derive(Debug, Deserialize)]
struct VariantsQueryData {
    product: Option<VariantsNode>,
}

#[derive(Debug, Deserialize)]
struct VariantsNode {
    variants: VariantConnection,
}

#[derive(Debug, Deserialize)]
struct VariantConnection {
    nodes: Vec<ProductVariant>,
}

/// Client for the storefront API of one shop.
pub struct StorefrontClient<'a, T> {
    fetch: &'a FetchClient<T>,
    endpoint: String,
    access_token: String,
}

impl<'a, T: HttpTransport> StorefrontClient<'a, T> {
    /// `store_domain` may be given with or without a scheme.
    pub fn new(
        fetch: &'a FetchClient<T>,
        store_domain: &str,
        api_version: &str,
        access_token: impl Into<String>,
    ) -> Self {
        let domain = store_domain
            .trim()
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        Self {
            fetch,
            endpoint: format!("https://{}/api/{}/graphql.json", domain, api_version),
            access_token: access_token.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Run a GraphQL document and decode `data`.
    ///
    /// Any entry in `errors` fails the query, even when partial data came back.
    pub async fn query<D: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> CommerceResult<D> {
        let request = OutboundRequest::post(&self.endpoint)
            .header("x-shopify-storefront-access-token", &self.access_token)
            .accept("application/json")
            .json(&json!({ "query": query, "variables": variables }))?;

        let response: GraphQlResponse<D> = self
            .fetch
            .send(request, DependencyTag::Storefront)
            .await?
            .json()?;

        if !response.errors.is_empty() {
            return Err(CommerceError::GraphQl(
                response.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        response
            .data
            .ok_or_else(|| CommerceError::InvalidResponse("response has no data".to_string()))
    }

    /// Load the product page for `handle`.
    ///
    /// The product and its full variant list are fetched concurrently.
    pub async fn product_page(
        &self,
        handle: &str,
        selected_options: &[SelectedOption],
    ) -> CommerceResult<ProductPage> {
        let product_doc = with_fragment(PRODUCT_QUERY);
        let variants_doc = with_fragment(VARIANTS_QUERY);
        let product_query = self.query::<ProductQueryData>(
            &product_doc,
            json!({ "handle": handle, "selectedOptions": selected_options }),
        );
        let variants_query =
            self.query::<VariantsQueryData>(&variants_doc, json!({ "handle": handle }));

        let (product_data, variants_data) = futures::join!(product_query, variants_query);
        let product_data = product_data?;

        let mut product = product_data
            .product
            .ok_or_else(|| CommerceError::ProductNotFound(handle.to_string()))?;
        if let Some(node) = variants_data?.product {
            product.variants = node.variants.nodes;
        }

        Ok(ProductPage {
            product,
            shop: product_data.shop,
        })
    }
}

fn with_fragment(query: &str) -> String {
    format!("{}{}", query, PRODUCT_VARIANT_FRAGMENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::RequestId;
    use edge_data::mock::MockTransport;
    use edge_security::OutboundAllowlist;
    use futures::executor::block_on;

    fn fetch(transport: MockTransport) -> FetchClient<MockTransport> {
        FetchClient::new(
            transport,
            RequestId::from_string("req-1"),
            OutboundAllowlist::new().allow_host("shop.example.com"),
        )
    }

    fn product_json() -> serde_json::Value {
        json!({
            "data": {
                "product": {
                    "id": "gid://shopify/Product/1",
                    "handle": "silk-dress",
                    "title": "Silk Dress",
                    "options": [{"name": "Size", "values": ["S"]}],
                    "selectedVariant": null,
                    "media": {"nodes": []}
                },
                "shop": {"name": "Atelier", "shippingPolicy": null, "refundPolicy": null}
            }
        })
    }

    fn variants_json() -> serde_json::Value {
        json!({
            "data": {"product": {"variants": {"nodes": [{
                "id": "gid://shopify/ProductVariant/11",
                "title": "S",
                "availableForSale": true,
                "quantityAvailable": 4,
                "selectedOptions": [{"name": "Size", "value": "S"}],
                "price": {"amount": "80.0", "currencyCode": "USD"},
                "compareAtPrice": null
            }]}}}
        })
    }

    #[test]
    fn test_endpoint_normalizes_domain() {
        let fetch = fetch(MockTransport::new());
        let client = StorefrontClient::new(&fetch, "https://shop.example.com/", "2024-10", "tok");
        assert_eq!(client.endpoint(), "https://shop.example.com/api/2024-10/graphql.json");
    }

    #[test]
    fn test_product_page_merges_variants() {
        let fetch = fetch(
            MockTransport::new()
                .reply_json(200, product_json())
                .reply_json(200, variants_json()),
        );
        let client = StorefrontClient::new(&fetch, "shop.example.com", "2024-10", "tok");

        let page = block_on(client.product_page("silk-dress", &[SelectedOption::new("Size", "S")]))
            .unwrap();
        assert_eq!(page.shop.name, "Atelier");
        assert_eq!(page.product.variants.len(), 1);
        assert_eq!(page.product.default_variant().unwrap().price.amount_minor, 8000);

        let requests = fetch.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(
            requests[0].header_value("x-shopify-storefront-access-token"),
            Some("tok")
        );
        let body: serde_json::Value =
            serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["variables"]["selectedOptions"][0]["value"], "S");
        assert!(body["query"].as_str().unwrap().contains("fragment ProductVariant"));

        let variants: serde_json::Value =
            serde_json::from_slice(requests[1].body.as_deref().unwrap()).unwrap();
        assert_eq!(variants["variables"]["handle"], "silk-dress");
        assert!(variants["query"].as_str().unwrap().contains("variants(first: 250)"));
    }

    #[test]
    fn test_variant_lookup_tolerates_foreign_params() {
        let fetch = fetch(
            MockTransport::new()
                .reply_json(200, product_json())
                .reply_json(200, variants_json()),
        );
        let client = StorefrontClient::new(&fetch, "shop.example.com", "2024-10", "tok");
        let options = [
            SelectedOption::new("size", "s"),
            SelectedOption::new("utm_source", "newsletter"),
        ];
        block_on(client.product_page("silk-dress", &options)).unwrap();

        let requests = fetch.transport().requests();
        let body: serde_json::Value =
            serde_json::from_slice(requests[0].body.as_deref().unwrap()).unwrap();
        let query = body["query"].as_str().unwrap();
        assert!(query.contains("ignoreUnknownOptions: true"));
        assert!(query.contains("caseInsensitiveMatch: true"));
        assert_eq!(body["variables"]["selectedOptions"][1]["name"], "utm_source");
    }

    #[test]
    fn test_missing_product_is_not_found() {
        let fetch = fetch(
            MockTransport::new()
                .reply_json(200, json!({"data": {"product": null, "shop": {"name": "Atelier"}}}))
                .reply_json(200, json!({"data": {"product": null}})),
        );
        let client = StorefrontClient::new(&fetch, "shop.example.com", "2024-10", "tok");

        let err = block_on(client.product_page("missing", &[])).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_graphql_errors_fail_the_query() {
        let fetch = fetch(MockTransport::new().reply_json(
            200,
            json!({"data": null, "errors": [{"message": "Throttled"}]}),
        ));
        let client = StorefrontClient::new(&fetch, "shop.example.com", "2024-10", "tok");

        let err = block_on(client.query::<serde_json::Value>("{ shop { name } }", json!({})))
            .unwrap_err();
        assert!(matches!(err, CommerceError::GraphQl(ref messages) if messages == &["Throttled"]));
    }
}
