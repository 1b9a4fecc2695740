//! Platform fetch client with dependency tagging.

use std::collections::BTreeMap;

use edge_core::RequestId;
use edge_security::OutboundAllowlist;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::dependency::DependencyTag;
use crate::error::FetchError;
use crate::request::OutboundRequest;
use crate::response::Response;
use crate::retry::RetryPolicy;
use crate::transport::HttpTransport;

/// Platform-controlled fetch client.
///
/// Every request is checked against the outbound allowlist before it reaches
/// the transport, and retried according to its dependency tag.
pub struct FetchClient<T> {
    transport: T,
    request_id: RequestId,
    allowlist: OutboundAllowlist,
    default_headers: BTreeMap<String, String>,
}

impl<T: HttpTransport> FetchClient<T> {
    /// Create a new fetch client.
    pub fn new(transport: T, request_id: RequestId, allowlist: OutboundAllowlist) -> Self {
        Self {
            transport,
            request_id,
            allowlist,
            default_headers: BTreeMap::new(),
        }
    }

    /// Add a header sent with every request unless the request sets it.
    pub fn with_default_header(mut self, key: &str, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.to_lowercase(), value.into());
        self
    }

    /// Send a request with the tag's retry policy.
    pub async fn send(
        &self,
        request: OutboundRequest,
        tag: DependencyTag,
    ) -> Result<Response, FetchError> {
        self.send_with_policy(request, RetryPolicy::for_tag(tag)).await
    }

    /// Send a request with an explicit retry policy.
    ///
    /// Non-2xx responses that exhaust the policy become `FetchError::Http`.
    pub async fn send_with_policy(
        &self,
        mut request: OutboundRequest,
        policy: RetryPolicy,
    ) -> Result<Response, FetchError> {
        self.allowlist.check_url(&request.url)?;

        for (key, value) in &self.default_headers {
            request
                .headers
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
        request
            .headers
            .entry("x-request-id".to_string())
            .or_insert_with(|| self.request_id.to_string());

        let mut attempt = 0;
        loop {
            match self.transport.send(&request).await {
                Ok(response) if response.is_success() => return Ok(response),
                Ok(response) => {
                    if policy.should_retry_status(response.status, attempt) {
                        attempt += 1;
                        continue;
                    }
                    return response.error_for_status(&request.url);
                }
                Err(FetchError::Connection(message)) => {
                    if policy.should_retry_connection(attempt) {
                        attempt += 1;
                        continue;
                    }
                    return Err(FetchError::Connection(message));
                }
                Err(other) => return Err(other),
            }
        }
    }

    /// GET a URL and decode the JSON body.
    pub async fn get_json<D: DeserializeOwned>(
        &self,
        url: &str,
        tag: DependencyTag,
    ) -> Result<D, FetchError> {
        let request = OutboundRequest::get(url).accept("application/json");
        self.send(request, tag).await?.json()
    }

    /// POST a JSON body and decode the JSON response.
    pub async fn post_json<B: Serialize, D: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        tag: DependencyTag,
    ) -> Result<D, FetchError> {
        let request = OutboundRequest::post(url)
            .accept("application/json")
            .json(body)?;
        self.send(request, tag).await?.json()
    }

    /// Get the request ID.
    pub fn request_id(&self) -> &RequestId {
        &self.request_id
    }

    /// Get the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}
