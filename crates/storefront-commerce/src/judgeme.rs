//! Judge.me reviews loader.

use edge_core::QueryString;
use edge_data::{DependencyTag, FetchClient, HttpTransport};
use serde::Deserialize;

use crate::error::CommerceResult;
use crate::reviews::{Review, ReviewsData};

pub const JUDGEME_API_BASE: &str = "https://judge.me/api/v1";

/// Reviews fetched per product.
pub const DEFAULT_PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct ReviewsResponse {
    #[serde(default)]
    reviews: Vec<JudgemeReview>,
}

#[derive(Debug, Deserialize)]
struct JudgemeReview {
    #[serde(flatten)]
    review: Review,
    #[serde(default = "yes")]
    published: bool,
    #[serde(default)]
    hidden: bool,
}

#[derive(Debug, Deserialize)]
struct ProductResponse {
    product: JudgemeProduct,
}

#[derive(Debug, Deserialize)]
struct JudgemeProduct {
    id: u64,
}

fn yes() -> bool {
    true
}

/// Client for the Judge.me public API of one shop.
pub struct JudgemeClient<'a, T> {
    fetch: &'a FetchClient<T>,
    shop_domain: String,
    api_token: String,
    per_page: u32,
}

impl<'a, T: HttpTransport> JudgemeClient<'a, T> {
    pub fn new(
        fetch: &'a FetchClient<T>,
        shop_domain: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        Self {
            fetch,
            shop_domain: shop_domain.into(),
            api_token: api_token.into(),
            per_page: DEFAULT_PER_PAGE,
        }
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    /// Judge.me's own ID for the product with `handle`.
    pub async fn product_id(&self, handle: &str) -> CommerceResult<u64> {
        let mut query = self.auth_query();
        query.append("handle", handle);
        let url = format!("{}/products/-1?{}", JUDGEME_API_BASE, query);

        let response: ProductResponse = self.fetch.get_json(&url, DependencyTag::Reviews).await?;
        Ok(response.product.id)
    }

    /// Published, visible reviews of a product.
    pub async fn reviews(&self, product_id: u64) -> CommerceResult<ReviewsData> {
        let mut query = self.auth_query();
        query.append("product_id", product_id.to_string());
        query.append("per_page", self.per_page.to_string());
        let url = format!("{}/reviews?{}", JUDGEME_API_BASE, query);

        let response: ReviewsResponse = self.fetch.get_json(&url, DependencyTag::Reviews).await?;
        let reviews = response
            .reviews
            .into_iter()
            .filter(|r| r.published && !r.hidden)
            .map(|r| r.review)
            .collect();

        Ok(ReviewsData::from_reviews(reviews))
    }

    /// Resolve the product by handle, then load its reviews.
    pub async fn reviews_for_handle(&self, handle: &str) -> CommerceResult<ReviewsData> {
        let product_id = self.product_id(handle).await?;
        self.reviews(product_id).await
    }

    fn auth_query(&self) -> QueryString {
        let mut query = QueryString::new();
        query.append("shop_domain", self.shop_domain.as_str());
        query.append("api_token", self.api_token.as_str());
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use edge_core::RequestId;
    use edge_data::mock::MockTransport;
    use edge_data::FetchError;
    use edge_security::OutboundAllowlist;
    use futures::executor::block_on;
    use serde_json::json;

    fn fetch(transport: MockTransport) -> FetchClient<MockTransport> {
        FetchClient::new(
            transport,
            RequestId::from_string("req-1"),
            OutboundAllowlist::new().allow_host("judge.me"),
        )
    }

    fn review(rating: u8, published: bool) -> serde_json::Value {
        json!({
            "id": 1,
            "rating": rating,
            "title": "Lovely",
            "body": "Great fit",
            "created_at": "2026-09-01T08:00:00+00:00",
            "reviewer": {"id": 9, "name": "Ana", "email": "ana@example.com"},
            "published": published,
            "hidden": false
        })
    }

    #[test]
    fn test_reviews_for_handle() {
        let fetch = fetch(
            MockTransport::new()
                .reply_json(200, json!({"product": {"id": 555, "handle": "silk-dress"}}))
                .reply_json(200, json!({"current_page": 1, "reviews": [review(5, true), review(3, true), review(1, false)]})),
        );
        let client = JudgemeClient::new(&fetch, "shop.example.com", "secret token").with_per_page(20);

        let data = block_on(client.reviews_for_handle("silk-dress")).unwrap();
        assert_eq!(data.review_number, 2);
        assert!((data.rating - 4.0).abs() < f64::EPSILON);
        assert_eq!(data.reviews[0].reviewer.email.as_deref(), Some("ana@example.com"));

        let requests = fetch.transport().requests();
        assert_eq!(
            requests[0].url,
            "https://judge.me/api/v1/products/-1?shop_domain=shop.example.com&api_token=secret+token&handle=silk-dress"
        );
        assert!(requests[1].url.ends_with("&product_id=555&per_page=20"));
    }

    #[test]
    fn test_failure_is_reported() {
        let fetch = fetch(MockTransport::new().reply_error(FetchError::Connection("reset".to_string())));
        let client = JudgemeClient::new(&fetch, "shop.example.com", "t");
        assert!(block_on(client.reviews(1)).is_err());
    }
}
