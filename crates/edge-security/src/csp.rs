//! Content Security Policy assembly.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Well-known directive names.
pub mod directive {
    pub const BASE_URI: &str = "base-uri";
    pub const CONNECT_SRC: &str = "connect-src";
    pub const DEFAULT_SRC: &str = "default-src";
    pub const FONT_SRC: &str = "font-src";
    pub const FRAME_ANCESTORS: &str = "frame-ancestors";
    pub const IMG_SRC: &str = "img-src";
    pub const SCRIPT_SRC: &str = "script-src";
    pub const STYLE_SRC: &str = "style-src";
    pub const UPGRADE_INSECURE_REQUESTS: &str = "upgrade-insecure-requests";
}

const NONE: &str = "'none'";

/// Whether the policy is enforced or only reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CspMode {
    /// Violations are reported, nothing is blocked.
    #[default]
    ReportOnly,
    /// Violations are blocked.
    Enforce,
}

/// A per-request script nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nonce(String);

impl Nonce {
    /// Generate 16 random bytes, base64 encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    /// Use a fixed value.
    pub fn from_value(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw nonce, as placed in `nonce="..."` attributes.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The CSP source expression (`'nonce-...'`).
    pub fn source(&self) -> String {
        format!("'nonce-{}'", self.0)
    }
}

/// Value of a single directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DirectiveValue {
    /// A source list.
    Sources(Vec<String>),
    /// A valueless directive that is either present or absent.
    Flag(bool),
}

/// An ordered set of directives.
///
/// Adding sources to an existing directive appends only those not already
/// present, so merging never produces duplicates and never reorders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CspDirectives {
    entries: Vec<(String, DirectiveValue)>,
}

impl CspDirectives {
    /// Create an empty directive set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Platform defaults for a storefront served from the commerce CDN.
    pub fn storefront_defaults() -> Self {
        let mut defaults = Self::new();
        defaults.add_sources(directive::BASE_URI, ["'self'"]);
        defaults.add_sources(
            directive::DEFAULT_SRC,
            ["'self'", "https://cdn.shopify.com", "https://shopify.com"],
        );
        defaults.add_sources(directive::FRAME_ANCESTORS, ["'none'"]);
        defaults.add_sources(
            directive::STYLE_SRC,
            ["'self'", "'unsafe-inline'", "https://cdn.shopify.com"],
        );
        defaults.add_sources(
            directive::CONNECT_SRC,
            ["'self'", "https://monorail-edge.shopifysvc.com"],
        );
        defaults
    }

    /// Add sources to a directive, skipping empty and duplicate values.
    ///
    /// A directive previously set as a flag becomes a source list. `'none'`
    /// cannot be combined with other sources and is dropped once one is added.
    pub fn add_sources<I, S>(&mut self, name: &str, sources: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let index = match self.entries.iter().position(|(n, _)| n == name) {
            Some(index) => index,
            None => {
                self.entries
                    .push((name.to_string(), DirectiveValue::Sources(Vec::new())));
                self.entries.len() - 1
            }
        };

        let value = &mut self.entries[index].1;
        if let DirectiveValue::Flag(_) = value {
            *value = DirectiveValue::Sources(Vec::new());
        }
        if let DirectiveValue::Sources(existing) = value {
            for source in sources {
                let source = source.as_ref().trim();
                if !source.is_empty() && !existing.iter().any(|s| s == source) {
                    existing.push(source.to_string());
                }
            }
            if existing.len() > 1 {
                existing.retain(|s| s != NONE);
            }
        }
    }

    /// Set a valueless directive.
    pub fn set_flag(&mut self, name: &str, enabled: bool) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, value)) => *value = DirectiveValue::Flag(enabled),
            None => self
                .entries
                .push((name.to_string(), DirectiveValue::Flag(enabled))),
        }
    }

    /// Merge another set into this one.
    pub fn merge(&mut self, other: &CspDirectives) {
        for (name, value) in &other.entries {
            match value {
                DirectiveValue::Sources(sources) => self.add_sources(name, sources),
                DirectiveValue::Flag(enabled) => self.set_flag(name, *enabled),
            }
        }
    }

    /// Sources of a directive.
    pub fn sources(&self, name: &str) -> Option<&[String]> {
        self.entries.iter().find_map(|(n, v)| match v {
            DirectiveValue::Sources(sources) if n == name => Some(sources.as_slice()),
            _ => None,
        })
    }

    /// Serialize as a header value.
    ///
    /// Empty source lists and disabled flags are omitted.
    pub fn to_header_value(&self) -> String {
        self.entries
            .iter()
            .filter_map(|(name, value)| match value {
                DirectiveValue::Sources(sources) if !sources.is_empty() => {
                    Some(format!("{} {}", name, sources.join(" ")))
                }
                DirectiveValue::Flag(true) => Some(name.clone()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// A fully assembled policy for one response.
#[derive(Debug, Clone)]
pub struct ContentSecurityPolicy {
    directives: CspDirectives,
    nonce: Nonce,
    mode: CspMode,
}

impl ContentSecurityPolicy {
    /// Start building a policy.
    pub fn builder() -> CspBuilder {
        CspBuilder::default()
    }

    /// Response header name for the configured mode.
    pub fn header_name(&self) -> &'static str {
        match self.mode {
            CspMode::ReportOnly => "Content-Security-Policy-Report-Only",
            CspMode::Enforce => "Content-Security-Policy",
        }
    }

    /// Response header value.
    pub fn header_value(&self) -> String {
        self.directives.to_header_value()
    }

    /// The nonce inline scripts must carry.
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    /// Final directives.
    pub fn directives(&self) -> &CspDirectives {
        &self.directives
    }
}

/// Builder for `ContentSecurityPolicy`.
#[derive(Debug, Default)]
pub struct CspBuilder {
    directives: CspDirectives,
    nonce: Option<Nonce>,
    mode: CspMode,
}

impl CspBuilder {
    /// Merge a directive set; earlier sets keep their ordering.
    pub fn with_directives(mut self, directives: CspDirectives) -> Self {
        self.directives.merge(&directives);
        self
    }

    /// Use a specific nonce instead of a generated one.
    pub fn nonce(mut self, nonce: Nonce) -> Self {
        self.nonce = Some(nonce);
        self
    }

    /// Set the enforcement mode.
    pub fn mode(mut self, mode: CspMode) -> Self {
        self.mode = mode;
        self
    }

    /// Finish the policy, adding the nonce to `script-src` and `default-src`.
    pub fn build(self) -> ContentSecurityPolicy {
        let nonce = self.nonce.unwrap_or_else(Nonce::generate);
        let mut directives = self.directives;

        let script_defaults: Vec<String> = match directives.sources(directive::SCRIPT_SRC) {
            Some(_) => Vec::new(),
            None => vec![
                "'self'".to_string(),
                "https://cdn.shopify.com".to_string(),
            ],
        };
        directives.add_sources(directive::SCRIPT_SRC, script_defaults);
        directives.add_sources(directive::SCRIPT_SRC, [nonce.source()]);
        directives.add_sources(directive::DEFAULT_SRC, [nonce.source()]);

        ContentSecurityPolicy {
            directives,
            nonce,
            mode: self.mode,
        }
    }
}
