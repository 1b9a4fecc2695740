//! Route configuration and path matching.

use serde::{Deserialize, Serialize};

use crate::context::{Method, RouteParams};

/// Configuration for a single route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// Route pattern (e.g., "/products/:handle").
    pub pattern: String,
    /// Handler name the workload dispatches on.
    pub handler: String,
    /// HTTP methods this route accepts.
    #[serde(default = "default_methods")]
    pub methods: Vec<String>,
}

fn default_methods() -> Vec<String> {
    vec!["GET".to_string()]
}

impl RouteConfig {
    /// Create a new route configuration.
    pub fn new(pattern: impl Into<String>, handler: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            handler: handler.into(),
            methods: default_methods(),
        }
    }

    /// Set allowed HTTP methods.
    pub fn with_methods(mut self, methods: Vec<&str>) -> Self {
        self.methods = methods.into_iter().map(|m| m.to_uppercase()).collect();
        self
    }

    /// Whether this route accepts the method.
    pub fn accepts(&self, method: Method) -> bool {
        self.methods.iter().any(|m| m == method.as_str())
    }

    /// Match a request path against the pattern, extracting `:name` segments.
    ///
    /// Trailing slashes are ignored. Returns `None` when the segment counts or
    /// literal segments differ.
    pub fn match_path(&self, path: &str) -> Option<RouteParams> {
        let pattern_segments = segments(&self.pattern);
        let path_segments = segments(path);

        if pattern_segments.len() != path_segments.len() {
            return None;
        }

        let mut params = RouteParams::new();
        for (expected, actual) in pattern_segments.iter().zip(path_segments.iter()) {
            if let Some(name) = expected.strip_prefix(':') {
                if actual.is_empty() {
                    return None;
                }
                params.insert(name.to_string(), actual.to_string());
            } else if expected != actual {
                return None;
            }
        }

        Some(params)
    }
}

fn segments(path: &str) -> Vec<&str> {
    let path = path.split('?').next().unwrap_or(path);
    path.trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_extracts_params() {
        let route = RouteConfig::new("/products/:handle", "product");
        let params = route.match_path("/products/linen-dress/").unwrap();
        assert_eq!(params.get("handle").map(String::as_str), Some("linen-dress"));
    }

    #[test]
    fn test_match_rejects_other_shapes() {
        let route = RouteConfig::new("/api/try-on/:request_id", "try_on_status");
        assert!(route.match_path("/api/try-on").is_none());
        assert!(route.match_path("/api/other/abc").is_none());
        assert!(route.match_path("/api/try-on/abc/extra").is_none());
    }

    #[test]
    fn test_methods_are_normalized() {
        let route = RouteConfig::new("/api/try-on", "try_on_submit").with_methods(vec!["post"]);
        assert!(route.accepts(Method::Post));
        assert!(!route.accepts(Method::Get));
    }
}
