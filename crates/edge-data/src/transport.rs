//! Host transport seam.

use async_trait::async_trait;

use crate::error::FetchError;
use crate::request::OutboundRequest;
use crate::response::Response;

/// Sends a fully built request and returns the raw response.
///
/// Transports do not interpret status codes; that is the client's job.
/// Futures are not `Send`: the edge runtime is single-threaded.
#[async_trait(?Send)]
pub trait HttpTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<Response, FetchError>;
}

#[async_trait(?Send)]
impl<T: HttpTransport + ?Sized> HttpTransport for &T {
    async fn send(&self, request: &OutboundRequest) -> Result<Response, FetchError> {
        (**self).send(request).await
    }
}

/// Outbound HTTP through the Spin host.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SpinTransport;

#[cfg(target_arch = "wasm32")]
#[async_trait(?Send)]
impl HttpTransport for SpinTransport {
    async fn send(&self, request: &OutboundRequest) -> Result<Response, FetchError> {
        use edge_core::Method;
        use spin_sdk::http::{Method as SpinMethod, Request};

        let method = match request.method {
            Method::Get => SpinMethod::Get,
            Method::Post => SpinMethod::Post,
            Method::Put => SpinMethod::Put,
            Method::Patch => SpinMethod::Patch,
            Method::Delete => SpinMethod::Delete,
            Method::Head => SpinMethod::Head,
            Method::Options => SpinMethod::Options,
        };

        let mut builder = Request::builder();
        builder.method(method).uri(request.url.as_str());
        for (key, value) in &request.headers {
            builder.header(key.as_str(), value.as_str());
        }
        let outbound = builder.body(request.body.clone().unwrap_or_default()).build();

        let response: spin_sdk::http::Response = spin_sdk::http::send(outbound)
            .await
            .map_err(|e| FetchError::Connection(e.to_string()))?;

        let status = *response.status();
        let headers = response
            .headers()
            .map(|(k, v)| (k.to_lowercase(), v.as_str().unwrap_or("").to_string()))
            .collect();

        Ok(Response::new(status, headers, response.into_body()))
    }
}
