//! Catalog projections of the storefront API.
//!
//! Field names follow the GraphQL documents in [`crate::storefront`], which
//! alias `description` to `summary` and `descriptionHtml` to `description`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::{ProductId, VariantId};
use crate::money::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub url: String,
    #[serde(default)]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedOption {
    pub name: String,
    pub value: String,
}

impl SelectedOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    #[serde(default)]
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub available_for_sale: bool,
    /// `-1` when the variant cannot be sold at all.
    #[serde(default)]
    pub quantity_available: Option<i64>,
    pub price: Money,
    #[serde(default)]
    pub compare_at_price: Option<Money>,
    #[serde(default)]
    pub selected_options: Vec<SelectedOption>,
    #[serde(default)]
    pub image: Option<Image>,
    #[serde(default)]
    pub sku: Option<String>,
}

impl ProductVariant {
    /// Value of the named option.
    pub fn option_value(&self, name: &str) -> Option<&str> {
        self.selected_options
            .iter()
            .find(|o| o.name == name)
            .map(|o| o.value.as_str())
    }

    /// Whether every option of this variant appears in `options`.
    pub fn matches_options(&self, options: &[SelectedOption]) -> bool {
        !self.selected_options.is_empty()
            && self
                .selected_options
                .iter()
                .all(|own| options.iter().any(|o| o == own))
    }
}

/// A media node. Non-image media (video, 3D) carry no `image`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub image: Option<Image>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub handle: String,
    pub title: String,
    #[serde(default)]
    pub vendor: String,
    /// Plain-text description.
    #[serde(default)]
    pub summary: String,
    /// Description HTML, rendered as trusted merchant content.
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub options: Vec<ProductOption>,
    #[serde(default)]
    pub selected_variant: Option<ProductVariant>,
    #[serde(default, deserialize_with = "connection_nodes")]
    pub media: Vec<Media>,
    /// Filled from the separate variants query.
    #[serde(default, deserialize_with = "connection_nodes")]
    pub variants: Vec<ProductVariant>,
}

impl Product {
    /// The variant shown before any URL or user input: the server-selected
    /// variant, else the first variant.
    pub fn default_variant(&self) -> Option<&ProductVariant> {
        self.selected_variant.as_ref().or_else(|| self.variants.first())
    }

    pub fn variant(&self, id: &VariantId) -> Option<&ProductVariant> {
        self.variants
            .iter()
            .chain(self.selected_variant.iter())
            .find(|v| &v.id == id)
    }

    /// First variant whose every option appears in `options`.
    pub fn find_variant(&self, options: &[SelectedOption]) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| v.matches_options(options))
    }

    /// Gallery for a variant: its own image first, then the product media.
    pub fn gallery(&self, variant: Option<&ProductVariant>) -> Vec<Image> {
        variant
            .and_then(|v| v.image.clone())
            .into_iter()
            .chain(self.media.iter().filter_map(|m| m.image.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopPolicy {
    pub handle: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl ShopPolicy {
    /// The first `<p>` element of the body, else the whole body.
    pub fn excerpt(&self) -> &str {
        excerpt(&self.body)
    }

    pub fn url(&self) -> String {
        format!("/policies/{}", self.handle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shop {
    pub name: String,
    #[serde(default)]
    pub shipping_policy: Option<ShopPolicy>,
    #[serde(default)]
    pub refund_policy: Option<ShopPolicy>,
}

fn excerpt(body: &str) -> &str {
    let mut search_from = 0;
    while let Some(offset) = body[search_from..].find("<p") {
        let start = search_from + offset;
        let after_tag = &body[start + 2..];
        if after_tag.starts_with('>') || after_tag.starts_with(char::is_whitespace) {
            return match after_tag.find("</p>") {
                Some(close) => &body[start..start + 2 + close + 4],
                None => body,
            };
        }
        search_from = start + 2;
    }
    body
}

fn connection_nodes<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    struct Connection<T> {
        nodes: Vec<T>,
    }

    Option::<Connection<T>>::deserialize(deserializer).map(|c| c.map(|c| c.nodes).unwrap_or_default())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::money::Currency;

    pub fn variant(id: u64, color: &str, size: &str, available: bool) -> ProductVariant {
        ProductVariant {
            id: VariantId::from_legacy(id),
            title: format!("{} / {}", color, size),
            available_for_sale: available,
            quantity_available: Some(if available { 3 } else { 0 }),
            price: Money::new(8000, Currency::USD),
            compare_at_price: None,
            selected_options: vec![
                SelectedOption::new("Color", color),
                SelectedOption::new("Size", size),
            ],
            image: None,
            sku: None,
        }
    }

    pub fn product() -> Product {
        Product {
            id: ProductId::from_legacy(1),
            handle: "silk-dress".to_string(),
            title: "Silk Dress".to_string(),
            vendor: "Atelier".to_string(),
            summary: "A silk dress.".to_string(),
            description: "<p>A silk dress.</p>".to_string(),
            published_at: None,
            options: vec![
                ProductOption {
                    name: "Color".to_string(),
                    values: vec!["Red".to_string(), "Blue".to_string()],
                },
                ProductOption {
                    name: "Size".to_string(),
                    values: vec!["S".to_string(), "M".to_string()],
                },
            ],
            selected_variant: None,
            media: Vec::new(),
            variants: vec![
                variant(11, "Red", "S", true),
                variant(12, "Red", "M", true),
                variant(13, "Blue", "S", false),
                variant(14, "Blue", "M", true),
            ],
        }
    }
}
