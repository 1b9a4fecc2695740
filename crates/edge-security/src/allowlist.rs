//! Outbound request allowlist for host filtering.
//!
//! Workloads may only reach the hosts they declare. Everything else is
//! rejected before a request leaves the runtime.

use serde::{Deserialize, Serialize};

/// Result type for allowlist operations.
pub type AllowlistResult<T> = Result<T, AllowlistError>;

/// Errors from allowlist operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllowlistError {
    #[error("host not allowed: {0}")]
    HostNotAllowed(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("scheme not allowed: {0}")]
    SchemeNotAllowed(String),
}

/// Outbound request allowlist.
///
/// Deny rules take precedence over allow rules. Loopback hosts are always
/// rejected unless explicitly enabled.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutboundAllowlist {
    allowed_hosts: Vec<String>,
    /// Patterns with a single `*` wildcard, e.g. `*.myshopify.com`.
    allowed_patterns: Vec<String>,
    denied_hosts: Vec<String>,
    allowed_schemes: Vec<String>,
    allow_localhost: bool,
    default_allow: bool,
}

impl OutboundAllowlist {
    /// Create an empty allowlist: https only, deny by default.
    pub fn new() -> Self {
        Self {
            allowed_schemes: vec!["https".to_string()],
            ..Default::default()
        }
    }

    /// Allow every https host. Intended for local development only.
    pub fn permissive() -> Self {
        Self {
            default_allow: true,
            ..Self::new()
        }
    }

    /// Allow an exact host.
    pub fn allow_host(mut self, host: impl Into<String>) -> Self {
        let host = normalize_host(&host.into());
        if !host.is_empty() && !self.allowed_hosts.contains(&host) {
            self.allowed_hosts.push(host);
        }
        self
    }

    /// Allow several exact hosts.
    pub fn allow_hosts<I, S>(self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        hosts.into_iter().fold(self, |list, host| list.allow_host(host))
    }

    /// Allow a wildcard pattern.
    pub fn allow_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.allowed_patterns.push(pattern.into().to_lowercase());
        self
    }

    /// Always reject a host, even if an allow rule matches it.
    pub fn deny_host(mut self, host: impl Into<String>) -> Self {
        self.denied_hosts.push(normalize_host(&host.into()));
        self
    }

    /// Permit plain http in addition to https.
    pub fn allow_http(mut self) -> Self {
        if !self.allowed_schemes.iter().any(|s| s == "http") {
            self.allowed_schemes.push("http".to_string());
        }
        self
    }

    /// Permit loopback hosts.
    pub fn allow_localhost(mut self, allow: bool) -> Self {
        self.allow_localhost = allow;
        self
    }

    /// Check that a URL may be fetched.
    pub fn check_url(&self, url: &str) -> AllowlistResult<()> {
        let (scheme, host) = split_url(url)?;

        if !self.allowed_schemes.iter().any(|s| *s == scheme) {
            return Err(AllowlistError::SchemeNotAllowed(scheme));
        }

        self.check_host(&host)
    }

    /// Check that a host may be contacted.
    pub fn check_host(&self, host: &str) -> AllowlistResult<()> {
        let host = normalize_host(host);
        let rejected =
            || -> AllowlistResult<()> { Err(AllowlistError::HostNotAllowed(host.clone())) };

        if is_loopback(&host) {
            return if self.allow_localhost { Ok(()) } else { rejected() };
        }

        if self.denied_hosts.contains(&host) {
            return rejected();
        }

        let allowed = self.allowed_hosts.contains(&host)
            || self
                .allowed_patterns
                .iter()
                .any(|pattern| matches_pattern(&host, pattern));

        if allowed || self.default_allow {
            Ok(())
        } else {
            rejected()
        }
    }

    /// Hosts allowed by exact match.
    pub fn allowed_hosts(&self) -> &[String] {
        &self.allowed_hosts
    }
}

/// Split a URL into its lowercase scheme and host, dropping any port.
fn split_url(url: &str) -> AllowlistResult<(String, String)> {
    let (scheme, rest) = url
        .split_once("://")
        .ok_or_else(|| AllowlistError::InvalidUrl(format!("missing scheme: {}", url)))?;

    let authority = rest
        .split(|c: char| c == '/' || c == '?' || c == '#')
        .next()
        .unwrap_or_default();
    let authority = authority.rsplit_once('@').map_or(authority, |(_, a)| a);

    let host = if let Some(bracketed) = authority.strip_prefix('[') {
        bracketed.split(']').next().unwrap_or_default()
    } else {
        authority.split(':').next().unwrap_or_default()
    };

    if host.is_empty() {
        return Err(AllowlistError::InvalidUrl(format!("missing host: {}", url)));
    }

    Ok((scheme.to_lowercase(), host.to_lowercase()))
}

/// Accepts bare hosts as well as URLs, as config values often carry either.
fn normalize_host(value: &str) -> String {
    let value = value.trim();
    match split_url(value) {
        Ok((_, host)) => host,
        Err(_) => value
            .trim_end_matches('/')
            .split(':')
            .next()
            .unwrap_or_default()
            .to_lowercase(),
    }
}

fn is_loopback(host: &str) -> bool {
    host == "localhost" || host == "::1" || host.starts_with("127.")
}

fn matches_pattern(host: &str, pattern: &str) -> bool {
    match pattern.split_once('*') {
        None => host == pattern,
        Some((prefix, suffix)) => {
            host.len() > prefix.len() + suffix.len()
                && host.starts_with(prefix)
                && host.ends_with(suffix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denies_by_default() {
        let list = OutboundAllowlist::new();
        assert!(matches!(
            list.check_url("https://example.com/"),
            Err(AllowlistError::HostNotAllowed(_))
        ));
    }

    #[test]
    fn test_exact_host() {
        let list = OutboundAllowlist::new().allow_host("queue.fal.run");
        assert!(list.check_url("https://queue.fal.run/fal-ai/kling").is_ok());
        assert!(list.check_url("https://QUEUE.fal.run:443/x?y=1").is_ok());
        assert!(list.check_url("https://fal.run/").is_err());
    }

    #[test]
    fn test_host_from_url_value() {
        let list = OutboundAllowlist::new().allow_hosts(["https://shop.example.com/", "judge.me"]);
        assert_eq!(list.allowed_hosts(), &["shop.example.com", "judge.me"]);
    }

    #[test]
    fn test_wildcard_pattern() {
        let list = OutboundAllowlist::new().allow_pattern("*.myshopify.com");
        assert!(list.check_host("demo.myshopify.com").is_ok());
        assert!(list.check_host("myshopify.com").is_err());
        assert!(list.check_host("demo.myshopify.com.evil.io").is_err());
    }

    #[test]
    fn test_deny_wins() {
        let list = OutboundAllowlist::permissive().deny_host("blocked.example.com");
        assert!(list.check_host("other.example.com").is_ok());
        assert!(list.check_host("blocked.example.com").is_err());
    }

    #[test]
    fn test_scheme_and_loopback() {
        let list = OutboundAllowlist::permissive();
        assert_eq!(
            list.check_url("http://example.com"),
            Err(AllowlistError::SchemeNotAllowed("http".to_string()))
        );
        assert!(list.check_url("https://127.0.0.1/").is_err());
        assert!(list
            .clone()
            .allow_http()
            .allow_localhost(true)
            .check_url("http://localhost:3000/")
            .is_ok());
    }

    #[test]
    fn test_invalid_url() {
        let list = OutboundAllowlist::permissive();
        assert!(matches!(
            list.check_url("not a url"),
            Err(AllowlistError::InvalidUrl(_))
        ));
    }
}
