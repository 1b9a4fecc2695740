//! Workload configuration from application variables.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use storefront_commerce::ButtonLabels;
use storefront_tryon::{Category, TryOnConfig};

pub const DEFAULT_API_VERSION: &str = "2024-10";
pub const DEFAULT_PAGE_BUILDER_HOST: &str = "https://studio.weaverse.io";

/// Merchant settings of the product information section.
///
/// Read from the `product_section` variable as JSON; missing fields keep
/// their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionSettings {
    pub labels: ButtonLabels,
    pub show_vendor: bool,
    pub show_sale_price: bool,
    pub show_short_description: bool,
    pub show_shipping_policy: bool,
    pub show_refund_policy: bool,
    pub hide_unavailable_options: bool,
}

impl Default for SectionSettings {
    fn default() -> Self {
        Self {
            labels: ButtonLabels::default(),
            show_vendor: false,
            show_sale_price: true,
            show_short_description: true,
            show_shipping_policy: true,
            show_refund_policy: true,
            hide_unavailable_options: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorefrontConfig {
    /// Shop domain without scheme, e.g. `atelier.myshopify.com`.
    pub store_domain: String,
    pub storefront_api_token: String,
    pub storefront_api_version: String,
    /// Reviews are skipped without a token.
    pub judgeme_api_token: Option<String>,
    /// Try-on is disabled without a key.
    pub fal_key: Option<String>,
    pub tryon: TryOnConfig,
    pub csp_enforce: bool,
    pub page_builder_host: String,
    pub section: SectionSettings,
}

impl StorefrontConfig {
    /// Resolve every variable through `lookup`.
    ///
    /// Empty values count as unset. The store domain and storefront token
    /// are required; everything else has a default.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let store_domain = get("store_domain")
            .context("missing variable store_domain")?
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/')
            .to_string();
        let storefront_api_token =
            get("storefront_api_token").context("missing variable storefront_api_token")?;

        let mut tryon = TryOnConfig::default();
        if let Some(garment) = get("tryon_garment_image") {
            tryon.garment_image = garment;
        }
        if let Some(category) = get("tryon_category") {
            tryon.category = match Category::parse(&category) {
                Some(category) => category,
                None => bail!("invalid tryon_category {:?}", category),
            };
        }

        let section = match get("product_section") {
            None => SectionSettings::default(),
            Some(raw) => serde_json::from_str(&raw).context("invalid product_section")?,
        };

        let csp_enforce = match get("csp_enforce").as_deref() {
            None => false,
            Some(value) => parse_bool(value)
                .with_context(|| format!("invalid csp_enforce {:?}", value))?,
        };

        Ok(Self {
            store_domain,
            storefront_api_token,
            storefront_api_version: get("storefront_api_version")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            judgeme_api_token: get("judgeme_api_token"),
            fal_key: get("fal_key"),
            tryon,
            csp_enforce,
            page_builder_host: get("page_builder_host")
                .unwrap_or_else(|| DEFAULT_PAGE_BUILDER_HOST.to_string()),
            section,
        })
    }

    /// Resolve from the Spin application variables.
    #[cfg(target_arch = "wasm32")]
    pub fn from_spin() -> anyhow::Result<Self> {
        Self::from_lookup(|name| spin_sdk::variables::get(name).ok())
    }

    pub fn store_origin(&self) -> String {
        format!("https://{}", self.store_domain)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
