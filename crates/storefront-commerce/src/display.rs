//! Values derived from catalog data for display.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::ProductVariant;
use crate::money::Money;

/// Products published within this many days get the new-arrival badge.
pub const NEW_ARRIVAL_DAYS: i64 = 30;

/// Merchant-configurable add-to-cart button texts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonLabels {
    pub add_to_cart: String,
    pub sold_out: String,
    pub unavailable: String,
}

impl Default for ButtonLabels {
    fn default() -> Self {
        Self {
            add_to_cart: "Add to cart".to_string(),
            sold_out: "Sold out".to_string(),
            unavailable: "Unavailable".to_string(),
        }
    }
}

/// Label for the add-to-cart button.
///
/// Available variants get the add-to-cart text. A quantity of `-1` marks a
/// variant that cannot be sold; anything else is sold out.
pub fn add_to_cart_label<'a>(variant: Option<&ProductVariant>, labels: &'a ButtonLabels) -> &'a str {
    match variant {
        Some(v) if v.available_for_sale => &labels.add_to_cart,
        Some(v) if v.quantity_available == Some(-1) => &labels.unavailable,
        _ => &labels.sold_out,
    }
}

/// Whether the compare-at price is above the price.
pub fn is_discounted(price: &Money, compare_at: Option<&Money>) -> bool {
    compare_at.is_some_and(|c| c.currency == price.currency && c.amount_minor > price.amount_minor)
}

/// `compare_at / price - 1`, when it lies strictly between 0 and 1.
pub fn discount_fraction(variant: &ProductVariant) -> Option<f64> {
    let compare_at = variant.compare_at_price.as_ref()?;
    let fraction = compare_at.ratio_to(&variant.price)? - 1.0;
    (fraction > 0.0 && fraction < 1.0).then_some(fraction)
}

/// Discount badge text, e.g. `-25%`.
pub fn discount_badge(variant: &ProductVariant) -> Option<String> {
    discount_fraction(variant).map(|f| format!("-{}%", (f * 100.0).round() as i64))
}

/// Whether `published_at` falls after `now - NEW_ARRIVAL_DAYS`.
pub fn is_new_arrival(published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    published_at.is_some_and(|published| published > now - Duration::days(NEW_ARRIVAL_DAYS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::variant;
    use crate::money::Currency;
    use chrono::TimeZone;

    #[test]
    fn test_add_to_cart_label() {
        let labels = ButtonLabels::default();
        let mut v = variant(1, "Red", "S", true);
        assert_eq!(add_to_cart_label(Some(&v), &labels), "Add to cart");

        v.available_for_sale = false;
        assert_eq!(add_to_cart_label(Some(&v), &labels), "Sold out");

        v.quantity_available = Some(-1);
        assert_eq!(add_to_cart_label(Some(&v), &labels), "Unavailable");

        assert_eq!(add_to_cart_label(None, &labels), "Sold out");
    }

    #[test]
    fn test_discount_badge() {
        let mut v = variant(1, "Red", "S", true);
        assert_eq!(discount_badge(&v), None);

        v.compare_at_price = Some(Money::new(10000, Currency::USD));
        assert_eq!(discount_badge(&v), Some("-25%".to_string()));
        assert!(is_discounted(&v.price, v.compare_at_price.as_ref()));

        v.compare_at_price = Some(Money::new(20000, Currency::USD));
        assert_eq!(discount_badge(&v), None);

        v.compare_at_price = Some(Money::new(8000, Currency::USD));
        assert_eq!(discount_badge(&v), None);
        assert!(!is_discounted(&v.price, v.compare_at_price.as_ref()));
    }

    #[test]
    fn test_new_arrival_window() {
        let now = Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap();
        assert!(is_new_arrival(Some(now - Duration::days(29)), now));
        assert!(!is_new_arrival(Some(now - Duration::days(31)), now));
        assert!(!is_new_arrival(None, now));
    }
}
