//! Product details accordion.

use storefront_commerce::{Product, Shop, ShopPolicy};

use super::escape_html;
use crate::config::SectionSettings;

/// One expandable entry. `content` is merchant HTML and is not escaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailEntry<'a> {
    pub title: &'static str,
    pub content: &'a str,
    pub learn_more: Option<String>,
}

/// Description first, then the shipping and refund policies when enabled and
/// non-empty.
pub fn detail_entries<'a>(
    product: &'a Product,
    shop: &'a Shop,
    settings: &SectionSettings,
) -> Vec<DetailEntry<'a>> {
    let mut entries = vec![DetailEntry {
        title: "Description",
        content: &product.description,
        learn_more: None,
    }];

    let policies = [
        ("Shipping", settings.show_shipping_policy, shop.shipping_policy.as_ref()),
        ("Returns", settings.show_refund_policy, shop.refund_policy.as_ref()),
    ];
    for (title, enabled, policy) in policies {
        if let Some(policy) = policy.filter(|p| enabled && !p.body.trim().is_empty()) {
            entries.push(policy_entry(title, policy));
        }
    }

    entries
}

fn policy_entry<'a>(title: &'static str, policy: &'a ShopPolicy) -> DetailEntry<'a> {
    DetailEntry {
        title,
        content: policy.excerpt(),
        learn_more: Some(policy.url()),
    }
}

pub fn render_product_details(product: &Product, shop: &Shop, settings: &SectionSettings) -> String {
    let entries: String = detail_entries(product, shop, settings)
        .iter()
        .map(|entry| {
            let learn_more = entry
                .learn_more
                .as_ref()
                .map(|href| {
                    format!(
                        r#"<a class="details-learn-more" href="{}">Learn more</a>"#,
                        escape_html(href)
                    )
                })
                .unwrap_or_default();
            format!(
                r#"<details class="product-detail"><summary>{}</summary><div class="prose">{}</div>{}</details>"#,
                entry.title, entry.content, learn_more
            )
        })
        .collect();

    format!(
        r#"<section class="product-details" data-section="product-details">{}</section>"#,
        entries
    )
}
