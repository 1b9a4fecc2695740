//! Workload definition and routing.

use http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::RouteConfig;
use crate::context::{Method, RouteParams};

/// Workload manifest - explicit configuration for a deployable unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkloadManifest {
    /// Unique name for this workload.
    pub name: String,
    /// Semantic version.
    pub version: String,
    /// Routes this workload handles.
    pub routes: Vec<RouteConfig>,
}

/// A resolved route for an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// Handler name from the matched route.
    pub handler: String,
    /// Extracted path parameters.
    pub params: RouteParams,
}

impl WorkloadManifest {
    /// Create a new workload manifest.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            routes: Vec::new(),
        }
    }

    /// Add a route to this workload.
    pub fn with_route(mut self, route: RouteConfig) -> Self {
        self.routes.push(route);
        self
    }

    /// Resolve a request to the first route matching both path and method.
    ///
    /// A path that matches with the wrong method yields `MethodNotAllowed`.
    pub fn resolve(&self, method: Method, path: &str) -> Result<RouteMatch, WorkloadError> {
        let mut path_matched = false;

        for route in &self.routes {
            if let Some(params) = route.match_path(path) {
                if route.accepts(method) {
                    return Ok(RouteMatch {
                        handler: route.handler.clone(),
                        params,
                    });
                }
                path_matched = true;
            }
        }

        if path_matched {
            Err(WorkloadError::MethodNotAllowed(method.as_str().to_string()))
        } else {
            Err(WorkloadError::NotFound(path.to_string()))
        }
    }
}

/// Error type for workload operations.
#[derive(Debug, thiserror::Error)]
pub enum WorkloadError {
    #[error("Shell not sent before sections")]
    ShellNotSent,

    #[error("Streaming error: {0}")]
    StreamError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),
}

impl WorkloadError {
    /// HTTP status this error maps to.
    ///
    /// A path served only for other methods is reported as not found, so
    /// routing failures never reveal which methods a path accepts.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) | Self::MethodNotAllowed(_) => StatusCode::NOT_FOUND,
            Self::ShellNotSent | Self::StreamError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> WorkloadManifest {
        WorkloadManifest::new("storefront-pdp", "0.1.0")
            .with_route(RouteConfig::new("/products/:handle", "product"))
            .with_route(RouteConfig::new("/api/try-on", "submit").with_methods(vec!["POST"]))
    }

    #[test]
    fn test_resolve_route() {
        let matched = manifest().resolve(Method::Get, "/products/dress").unwrap();
        assert_eq!(matched.handler, "product");
        assert_eq!(matched.params.get("handle").unwrap(), "dress");
    }

    #[test]
    fn test_resolve_wrong_method() {
        let err = manifest().resolve(Method::Get, "/api/try-on").unwrap_err();
        assert!(matches!(err, WorkloadError::MethodNotAllowed(_)));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_resolve_unknown_path() {
        let err = manifest().resolve(Method::Get, "/cart").unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_stream_errors_are_server_errors() {
        assert_eq!(
            WorkloadError::ShellNotSent.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            WorkloadError::StreamError("closed".to_string()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
