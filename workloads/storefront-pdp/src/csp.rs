//! Per-request Content Security Policy.
//!
//! Three directive sets are merged in order: platform defaults, the page
//! builder's directives, then the storefront's fixed allow-list.

use edge_sdk::edge_security::{directive, ContentSecurityPolicy, CspDirectives, CspMode, Nonce};

use crate::config::StorefrontConfig;

pub const MONORAIL_ORIGIN: &str = "https://monorail-edge.shopifysvc.com";
pub const INFERENCE_QUEUE_ORIGIN: &str = "https://queue.fal.run";
pub const INFERENCE_MEDIA_ORIGIN: &str = "https://v3.fal.media/";
pub const DROPSHIP_ORIGIN: &str = "https://cf.cjdropshipping.com";
pub const DROPSHIP_STORAGE_ORIGIN: &str = "https://oss-cf.cjdropshipping.com/";
pub const PAGE_BUILDER_STUDIO: &str = "https://studio.weaverse.io/";

/// Directives the page builder needs to preview and edit the storefront.
pub fn page_builder_directives(host: &str) -> CspDirectives {
    let host = host.trim_end_matches('/');
    let mut directives = CspDirectives::new();
    directives.add_sources(directive::FRAME_ANCESTORS, [host]);
    directives.add_sources(directive::DEFAULT_SRC, ["'self'", "https://cdn.shopify.com", host]);
    directives.add_sources(
        directive::SCRIPT_SRC,
        ["'self'", "https://cdn.shopify.com", "https://*.weaverse.io", host],
    );
    directives.add_sources(directive::STYLE_SRC, ["'self'", "'unsafe-inline'", host]);
    directives.add_sources(
        directive::IMG_SRC,
        ["'self'", "data:", "https://cdn.shopify.com", "https://*.weaverse.io", host],
    );
    directives.add_sources(directive::CONNECT_SRC, ["https://*.weaverse.io", host]);
    directives
}

/// The storefront's own allow-list.
pub fn storefront_directives(store_domain: &str) -> CspDirectives {
    let mut directives = CspDirectives::new();
    directives.add_sources(
        directive::CONNECT_SRC,
        [
            "'self'",
            MONORAIL_ORIGIN,
            store_domain,
            INFERENCE_QUEUE_ORIGIN,
            DROPSHIP_ORIGIN,
        ],
    );
    directives.add_sources(
        directive::DEFAULT_SRC,
        [
            DROPSHIP_ORIGIN,
            INFERENCE_MEDIA_ORIGIN,
            DROPSHIP_STORAGE_ORIGIN,
            PAGE_BUILDER_STUDIO,
        ],
    );
    directives.add_sources(
        directive::FONT_SRC,
        ["'self'", "https://fonts.gstatic.com", "data:"],
    );
    directives
}

/// Assemble the policy for one response.
pub fn build_policy(config: &StorefrontConfig, nonce: Nonce) -> ContentSecurityPolicy {
    let mode = if config.csp_enforce {
        CspMode::Enforce
    } else {
        CspMode::ReportOnly
    };

    ContentSecurityPolicy::builder()
        .with_directives(CspDirectives::storefront_defaults())
        .with_directives(page_builder_directives(&config.page_builder_host))
        .with_directives(storefront_directives(&config.store_origin()))
        .nonce(nonce)
        .mode(mode)
        .build()
}

/// Policy for documents rendered without a valid configuration: platform
/// defaults only, report-only.
pub fn fallback_policy(nonce: Nonce) -> ContentSecurityPolicy {
    ContentSecurityPolicy::builder()
        .with_directives(CspDirectives::storefront_defaults())
        .nonce(nonce)
        .mode(CspMode::ReportOnly)
        .build()
}

/// The policy as a lowercase response header.
pub fn policy_header(policy: &ContentSecurityPolicy) -> (String, Vec<u8>) {
    (
        policy.header_name().to_lowercase(),
        policy.header_value().into_bytes(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(enforce: bool) -> StorefrontConfig {
        StorefrontConfig::from_lookup(|name| match name {
            "store_domain" => Some("atelier.myshopify.com".to_string()),
            "storefront_api_token" => Some("tok".to_string()),
            "csp_enforce" => Some(enforce.to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn assert_unique(sources: &[String]) {
        for (i, source) in sources.iter().enumerate() {
            assert!(!sources[i + 1..].contains(source), "duplicate {}", source);
        }
    }

    #[test]
    fn test_connect_src_allow_list() {
        let csp = build_policy(&config(false), Nonce::from_value("n0nce"));
        let connect = csp.directives().sources(directive::CONNECT_SRC).unwrap();

        assert_eq!(connect[0], "'self'");
        for expected in [
            MONORAIL_ORIGIN,
            "https://atelier.myshopify.com",
            INFERENCE_QUEUE_ORIGIN,
            DROPSHIP_ORIGIN,
            "https://studio.weaverse.io",
        ] {
            assert!(connect.iter().any(|s| s == expected), "missing {}", expected);
        }
        assert_unique(connect);
    }

    #[test]
    fn test_nonce_and_dedupe() {
        let csp = build_policy(&config(false), Nonce::from_value("n0nce"));
        let directives = csp.directives();

        for name in [directive::SCRIPT_SRC, directive::DEFAULT_SRC] {
            let sources = directives.sources(name).unwrap();
            assert!(sources.iter().any(|s| s == "'nonce-n0nce'"), "{}", name);
            assert_unique(sources);
        }
        assert_eq!(
            directives.sources(directive::FONT_SRC).unwrap(),
            &["'self'", "https://fonts.gstatic.com", "data:"]
        );
        assert_eq!(
            directives.sources(directive::FRAME_ANCESTORS).unwrap(),
            &["https://studio.weaverse.io"]
        );
        assert!(csp.header_value().contains("default-src 'self' https://cdn.shopify.com"));
    }

    #[test]
    fn test_mode_follows_config() {
        let nonce = Nonce::from_value("n");
        assert_eq!(
            build_policy(&config(false), nonce.clone()).header_name(),
            "Content-Security-Policy-Report-Only"
        );
        assert_eq!(
            build_policy(&config(true), nonce).header_name(),
            "Content-Security-Policy"
        );
    }

    #[test]
    fn test_fallback_policy_is_report_only() {
        let csp = fallback_policy(Nonce::from_value("n0nce"));
        let (name, value) = policy_header(&csp);
        assert_eq!(name, "content-security-policy-report-only");
        let value = String::from_utf8(value).unwrap();
        assert!(value.contains("'nonce-n0nce'"));
        assert!(!value.contains(INFERENCE_QUEUE_ORIGIN));
    }

    #[test]
    fn test_policy_header_follows_mode() {
        let (name, value) = policy_header(&build_policy(&config(true), Nonce::from_value("n")));
        assert_eq!(name, "content-security-policy");
        assert!(String::from_utf8(value).unwrap().contains(INFERENCE_QUEUE_ORIGIN));
    }
}
