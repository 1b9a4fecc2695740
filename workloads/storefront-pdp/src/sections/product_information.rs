//! Product information section: gallery, price, badges and variant picker.
//!
//! Option links work as plain navigation. With scripts enabled, a click swaps
//! in the picked variant from the embedded variant data and rewrites the URL
//! in place.

use chrono::{DateTime, Utc};
use edge_sdk::edge_core::QueryString;
use serde::Serialize;
use storefront_commerce::{
    add_to_cart_label, discount_badge, is_discounted, is_new_arrival, option_groups, OptionGroup,
    Money, Product, ProductVariant, SelectedOption, VariantSelection,
};

use super::escape_html;
use crate::config::SectionSettings;

/// Everything the section needs for one render.
pub struct ProductInformation<'a> {
    pub product: &'a Product,
    pub selection: &'a VariantSelection,
    /// Request path, used for variant links.
    pub path: &'a str,
    pub query: &'a QueryString,
    pub settings: &'a SectionSettings,
    pub now: DateTime<Utc>,
    pub nonce: &'a str,
}

/// A variant as the picker script sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PickerVariant {
    pub id: String,
    pub options: Vec<SelectedOption>,
    pub available: bool,
    pub price: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    pub label: String,
    /// URL after the shopper picks this variant.
    pub href: String,
}

/// Outcome of picking each variant from the current selection and URL.
pub fn picker_variants(view: &ProductInformation<'_>) -> Vec<PickerVariant> {
    let settings = view.settings;
    view.product
        .variants
        .iter()
        .filter_map(|variant| {
            let mut selection = view.selection.clone();
            let mut query = view.query.clone();
            let picked = selection.pick(view.product, &variant.id, &mut query)?;
            Some(PickerVariant {
                id: picked.id.as_str().to_string(),
                options: picked.selected_options.clone(),
                available: picked.available_for_sale,
                price: picked.price.format_without_trailing_zeros(),
                compare_at: sale_compare_at(picked, settings.show_sale_price)
                    .map(|money| money.format_without_trailing_zeros()),
                badge: discount_badge(picked),
                label: add_to_cart_label(Some(picked), &settings.labels).to_string(),
                href: query.to_url(view.path),
            })
        })
        .collect()
}

/// Render the product information section.
pub fn render_product_information(view: &ProductInformation<'_>) -> String {
    let product = view.product;
    let settings = view.settings;
    let selected = view.selection.variant(product);

    let vendor = if settings.show_vendor && !product.vendor.is_empty() {
        format!(
            r#"<span class="product-vendor">{}</span>"#,
            escape_html(&product.vendor)
        )
    } else {
        String::new()
    };

    let summary = if settings.show_short_description && !product.summary.is_empty() {
        format!(
            r#"<p class="product-summary">{}</p>"#,
            escape_html(&product.summary)
        )
    } else {
        String::new()
    };

    let groups = option_groups(
        product,
        selected,
        view.path,
        view.query,
        settings.hide_unavailable_options,
    );

    let label = add_to_cart_label(selected, &settings.labels);
    let available = selected.is_some_and(|v| v.available_for_sale);
    let merchandise_id = selected
        .map(|v| escape_html(v.id.as_str()))
        .unwrap_or_default();

    format!(
        r#"<section class="product-information" data-section="product-information">
    <nav class="breadcrumb"><a href="/">Home</a> <span>/</span> <span>{title}</span></nav>
    <div class="product-layout">
        {gallery}
        <div class="product-summary-column">
            <div class="product-badges">{badges}</div>
            <div class="product-heading">
                {vendor}
                <h1 class="product-title">{title}</h1>
            </div>
            {price}
            {summary}
            {picker}
            <form class="product-form" method="post" action="/cart">
                <input type="hidden" name="merchandiseId" value="{merchandise_id}">
                <label class="quantity">Quantity <input type="number" name="quantity" value="1" min="1"></label>
                <button type="button" class="btn-try-on" data-try-on-open>Try On</button>
                <button type="submit" class="btn-add-to-cart" data-test="add-to-cart"{disabled}>{label}</button>
            </form>
        </div>
    </div>
    <script type="application/json" data-variant-picker>{variants}</script>
    <script nonce="{nonce}">{script}</script>
</section>"#,
        title = escape_html(&product.title),
        gallery = render_gallery(product, selected),
        badges = render_badges(product, selected, view.now),
        vendor = vendor,
        price = render_price(selected, settings.show_sale_price),
        summary = summary,
        picker = render_picker(&groups),
        merchandise_id = merchandise_id,
        disabled = if available { "" } else { " disabled" },
        label = escape_html(label),
        variants = picker_json(&picker_variants(view)),
        nonce = escape_html(view.nonce),
        script = PICKER_SCRIPT,
    )
}

/// JSON for a `<script>` data block. `<` is escaped so the payload cannot
/// close the element.
fn picker_json(variants: &[PickerVariant]) -> String {
    serde_json::to_string(variants)
        .unwrap_or_else(|_| "[]".to_string())
        .replace('<', "\\u003c")
}

fn sale_compare_at(variant: &ProductVariant, show_sale_price: bool) -> Option<&Money> {
    variant
        .compare_at_price
        .as_ref()
        .filter(|compare_at| show_sale_price && is_discounted(&variant.price, Some(*compare_at)))
}

fn render_gallery(product: &Product, selected: Option<&ProductVariant>) -> String {
    let images: String = product
        .gallery(selected)
        .iter()
        .map(|image| {
            let alt = image.alt_text.as_deref().unwrap_or(&product.title);
            let size = match (image.width, image.height) {
                (Some(w), Some(h)) => format!(r#" width="{}" height="{}""#, w, h),
                _ => String::new(),
            };
            format!(
                r#"<img class="product-media" src="{}" alt="{}"{} loading="lazy">"#,
                escape_html(&image.url),
                escape_html(alt),
                size
            )
        })
        .collect();

    if images.is_empty() {
        return r#"<div class="product-gallery product-gallery--empty"></div>"#.to_string();
    }
    format!(r#"<div class="product-gallery">{}</div>"#, images)
}

fn render_badges(product: &Product, selected: Option<&ProductVariant>, now: DateTime<Utc>) -> String {
    let mut badges = String::new();
    if let Some(badge) = selected.and_then(discount_badge) {
        badges.push_str(&format!(
            r#"<span class="badge badge-discount">{}</span>"#,
            badge
        ));
    }
    if is_new_arrival(product.published_at, now) {
        badges.push_str(r#"<span class="badge badge-new">NEW ARRIVAL</span>"#);
    }
    badges
}

fn render_price(selected: Option<&ProductVariant>, show_sale_price: bool) -> String {
    let Some(variant) = selected else {
        return String::new();
    };

    let compare_at = match sale_compare_at(variant, show_sale_price) {
        Some(compare_at) => format!(
            r#" <s class="price-compare-at">{}</s>"#,
            escape_html(&compare_at.format_without_trailing_zeros())
        ),
        None => String::new(),
    };

    format!(
        r#"<div class="product-price"><span class="price">{}</span>{}</div>"#,
        escape_html(&variant.price.format_without_trailing_zeros()),
        compare_at
    )
}

fn render_picker(groups: &[OptionGroup]) -> String {
    groups
        .iter()
        .map(|group| {
            let values: String = group
                .values
                .iter()
                .map(|value| {
                    let mut class = String::from("option-value");
                    if value.selected {
                        class.push_str(" option-value--selected");
                    }
                    if !value.available {
                        class.push_str(" option-value--unavailable");
                    }
                    format!(
                        r#"<a class="{}" href="{}" data-option-name="{}" data-option-value="{}"{}>{}</a>"#,
                        class,
                        escape_html(&value.href),
                        escape_html(&group.name),
                        escape_html(&value.value),
                        if value.selected { r#" aria-current="true""# } else { "" },
                        escape_html(&value.value)
                    )
                })
                .collect();

            format!(
                r#"<fieldset class="product-option"><legend>{}</legend>{}</fieldset>"#,
                escape_html(&group.name),
                values
            )
        })
        .collect()
}

const PICKER_SCRIPT: &str = r#"
(function () {
  var root = document.currentScript.closest('[data-section="product-information"]');
  var variants = JSON.parse(root.querySelector('[data-variant-picker]').textContent);
  var merchandise = root.querySelector('input[name="merchandiseId"]');
  var links = root.querySelectorAll('[data-option-name]');
  var current = {};

  function find(wanted) {
    return variants.find(function (v) {
      return v.options.every(function (o) { return wanted[o.name] === o.value; });
    });
  }

  function optionsOf(variant) {
    var options = {};
    variant.options.forEach(function (o) { options[o.name] = o.value; });
    return options;
  }

  function withValue(name, value) {
    var wanted = Object.assign({}, current);
    wanted[name] = value;
    return wanted;
  }

  function renderPrice(variant) {
    var price = root.querySelector('.product-price');
    if (!price) { return; }
    price.querySelector('.price').textContent = variant.price;
    var compareAt = price.querySelector('.price-compare-at');
    if (compareAt) { compareAt.remove(); }
    if (variant.compare_at) {
      var s = document.createElement('s');
      s.className = 'price-compare-at';
      s.textContent = variant.compare_at;
      price.appendChild(document.createTextNode(' '));
      price.appendChild(s);
    }
    var badge = root.querySelector('.badge-discount');
    if (badge) { badge.remove(); }
    if (variant.badge) {
      var span = document.createElement('span');
      span.className = 'badge badge-discount';
      span.textContent = variant.badge;
      var badges = root.querySelector('.product-badges');
      badges.insertBefore(span, badges.firstChild);
    }
  }

  function select(variant) {
    current = optionsOf(variant);
    history.replaceState(history.state, '', variant.href);
    merchandise.value = variant.id;
    renderPrice(variant);
    var button = root.querySelector('[data-test="add-to-cart"]');
    button.textContent = variant.label;
    button.disabled = !variant.available;
    links.forEach(function (a) {
      var name = a.getAttribute('data-option-name');
      var value = a.getAttribute('data-option-value');
      var selected = current[name] === value;
      a.classList.toggle('option-value--selected', selected);
      if (selected) { a.setAttribute('aria-current', 'true'); } else { a.removeAttribute('aria-current'); }
      var target = find(withValue(name, value));
      if (target) {
        a.href = target.href;
        a.classList.toggle('option-value--unavailable', !target.available);
      }
    });
  }

  var initial = variants.find(function (v) { return v.id === merchandise.value; });
  if (initial) { current = optionsOf(initial); }

  links.forEach(function (a) {
    a.addEventListener('click', function (e) {
      var variant = find(withValue(a.getAttribute('data-option-name'), a.getAttribute('data-option-value')));
      if (!variant) { return; }
      e.preventDefault();
      select(variant);
    });
  });
})();
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::product;
    use chrono::TimeZone;
    use storefront_commerce::{Currency, Money, VariantId, VariantSelection};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 12, 0, 0).unwrap()
    }

    fn render(product: &Product, query: &str, settings: &SectionSettings) -> String {
        let query = QueryString::parse(query);
        let selection = VariantSelection::from_query(product, &query);
        render_product_information(&ProductInformation {
            product,
            selection: &selection,
            path: "/products/silk-dress",
            query: &query,
            settings,
            now: now(),
            nonce: "abc",
        })
    }

    fn embedded_variants(html: &str) -> serde_json::Value {
        let start = html.find("data-variant-picker>").unwrap() + "data-variant-picker>".len();
        let end = start + html[start..].find("</script>").unwrap();
        serde_json::from_str(&html[start..end]).unwrap()
    }

    #[test]
    fn test_selected_variant_from_query() {
        let product = product();
        let html = render(&product, "Color=Blue&Size=M", &SectionSettings::default());

        assert!(html.contains(r#"value="gid://shopify/ProductVariant/14""#));
        assert!(html.contains(">Add to cart</button>"));
        assert!(html.contains(
            r#"href="/products/silk-dress?Color=Red&amp;Size=M" data-option-name="Color" data-option-value="Red">Red</a>"#
        ));
        assert!(html.contains(r#"<h1 class="product-title">Silk Dress</h1>"#));
        assert!(html.contains(r#"<p class="product-summary">A silk dress.</p>"#));
    }

    #[test]
    fn test_sold_out_variant_disables_button() {
        let product = product();
        let html = render(&product, "Color=Blue&Size=S", &SectionSettings::default());
        assert!(html.contains(r#" disabled>Sold out</button>"#));
        assert!(html.contains("option-value--unavailable"));
    }

    #[test]
    fn test_discount_and_new_arrival_badges() {
        let mut product = product();
        product.published_at = Some(now() - chrono::Duration::days(3));
        product.variants[0].compare_at_price = Some(Money::new(10000, Currency::USD));

        let html = render(&product, "", &SectionSettings::default());
        assert!(html.contains(r#"<span class="badge badge-discount">-25%</span>"#));
        assert!(html.contains("NEW ARRIVAL"));
        assert!(html.contains(r#"<span class="price">$80</span> <s class="price-compare-at">$100</s>"#));

        let settings = SectionSettings {
            show_sale_price: false,
            ..SectionSettings::default()
        };
        assert!(!render(&product, "", &settings).contains("price-compare-at"));
    }

    #[test]
    fn test_hidden_unavailable_options_and_vendor() {
        let product = product();
        let settings = SectionSettings {
            hide_unavailable_options: true,
            show_vendor: true,
            ..SectionSettings::default()
        };
        let html = render(&product, "Size=S&Color=Red", &settings);
        assert!(!html.contains(r#"data-option-value="Blue""#));
        assert!(html.contains(r#"<span class="product-vendor">Atelier</span>"#));
        assert_eq!(
            VariantSelection::from_query(&product, &QueryString::parse("Size=S&Color=Red"))
                .variant_id(),
            Some(&VariantId::from_legacy(11))
        );
    }

    #[test]
    fn test_picks_replace_option_params() {
        let product = product();
        let html = render(
            &product,
            "Color=Red&Size=S&utm_source=mail&Color=Red",
            &SectionSettings::default(),
        );
        let variants = embedded_variants(&html);
        assert_eq!(variants.as_array().unwrap().len(), 4);

        let blue_m = &variants[3];
        assert_eq!(blue_m["id"], "gid://shopify/ProductVariant/14");
        assert_eq!(blue_m["href"], "/products/silk-dress?Color=Blue&Size=M&utm_source=mail");
        assert_eq!(blue_m["price"], "$80");
        assert_eq!(blue_m["label"], "Add to cart");

        let blue_s = &variants[2];
        assert_eq!(blue_s["available"], false);
        assert_eq!(blue_s["label"], "Sold out");
    }

    #[test]
    fn test_picker_script_rewrites_url_in_place() {
        let product = product();
        let html = render(&product, "", &SectionSettings::default());
        let script = html.find(r#"<script nonce="abc">"#).unwrap();
        assert!(html[script..].contains("history.replaceState"));
        assert!(html[script..].contains("e.preventDefault()"));
        assert!(html.contains(r#"data-option-name="Size" data-option-value="M""#));
    }

    #[test]
    fn test_embedded_variants_cannot_close_script() {
        let mut product = product();
        product.variants[0].selected_options[0].value = "</script><b>".to_string();
        let html = render(&product, "", &SectionSettings::default());
        assert!(!html.contains("</script><b>"));
        assert_eq!(
            embedded_variants(&html)[0]["options"][0]["value"],
            "</script><b>"
        );
    }
}
