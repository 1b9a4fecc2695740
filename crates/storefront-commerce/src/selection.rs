//! Variant selection and URL query synchronisation.
//!
//! The selected variant can come from three sources, lowest precedence first:
//!
//! 1. the server default (`selected_variant`, else the first variant),
//! 2. URL query parameters named after product options,
//! 3. a variant picked by the shopper.
//!
//! An update is applied only when its source ranks at least as high as the
//! source of the current selection, so a URL can override the server default
//! and a pick overrides both.

use edge_core::QueryString;

use crate::catalog::{Product, ProductVariant, SelectedOption};
use crate::ids::VariantId;

/// Origin of the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SelectionSource {
    ServerDefault,
    Url,
    User,
}

/// Selected variant of one product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSelection {
    variant: Option<VariantId>,
    source: SelectionSource,
}

impl VariantSelection {
    /// Start from the server default.
    pub fn new(product: &Product) -> Self {
        Self {
            variant: product.default_variant().map(|v| v.id.clone()),
            source: SelectionSource::ServerDefault,
        }
    }

    /// Server default refined by the request's query parameters.
    pub fn from_query(product: &Product, query: &QueryString) -> Self {
        let mut selection = Self::new(product);
        selection.apply_query(product, query);
        selection
    }

    /// Select the variant whose options all appear in `query`.
    ///
    /// Returns whether the selection changed source or variant.
    pub fn apply_query(&mut self, product: &Product, query: &QueryString) -> bool {
        let options = query_options(product, query);
        if options.is_empty() {
            return false;
        }
        match product.find_variant(&options) {
            Some(variant) => self.update(variant.id.clone(), SelectionSource::Url),
            None => false,
        }
    }

    /// Select a variant picked by the shopper and rewrite `query` to match.
    ///
    /// Every option of the variant is set in `query`, replacing any previous
    /// value, and unrelated parameters are left alone. Returns the variant, or
    /// `None` when the product has no such variant.
    pub fn pick<'p>(
        &mut self,
        product: &'p Product,
        id: &VariantId,
        query: &mut QueryString,
    ) -> Option<&'p ProductVariant> {
        let variant = product.variant(id)?;
        self.update(variant.id.clone(), SelectionSource::User);
        sync_query(variant, query);
        Some(variant)
    }

    /// The selected variant, resolved against `product`.
    pub fn variant<'p>(&self, product: &'p Product) -> Option<&'p ProductVariant> {
        self.variant.as_ref().and_then(|id| product.variant(id))
    }

    pub fn variant_id(&self) -> Option<&VariantId> {
        self.variant.as_ref()
    }

    pub fn source(&self) -> SelectionSource {
        self.source
    }

    fn update(&mut self, id: VariantId, source: SelectionSource) -> bool {
        if source < self.source {
            return false;
        }
        let changed = self.variant.as_ref() != Some(&id) || self.source != source;
        self.variant = Some(id);
        self.source = source;
        changed
    }
}

/// Query parameters whose names match one of the product's options.
pub fn query_options(product: &Product, query: &QueryString) -> Vec<SelectedOption> {
    product
        .options
        .iter()
        .filter_map(|option| {
            query
                .get(&option.name)
                .map(|value| SelectedOption::new(option.name.clone(), value))
        })
        .collect()
}

/// Set one parameter per option of `variant`, replacing existing values.
pub fn sync_query(variant: &ProductVariant, query: &mut QueryString) {
    for option in &variant.selected_options {
        query.set(option.name.clone(), option.value.clone());
    }
}

/// One selectable option value in the variant picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionValueLink {
    pub value: String,
    /// `path?query` that selects this value.
    pub href: String,
    pub selected: bool,
    /// Whether the variant this value leads to can be bought.
    pub available: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionGroup {
    pub name: String,
    pub values: Vec<OptionValueLink>,
}

/// Build the picker for every product option.
///
/// Each value links to the variant that keeps the other selected options and
/// swaps in this value. Values with no purchasable variant are marked
/// unavailable, or dropped when `hide_unavailable` is set.
pub fn option_groups(
    product: &Product,
    selected: Option<&ProductVariant>,
    path: &str,
    query: &QueryString,
    hide_unavailable: bool,
) -> Vec<OptionGroup> {
    product
        .options
        .iter()
        .map(|option| {
            let current = selected.and_then(|v| v.option_value(&option.name));
            let values = option
                .values
                .iter()
                .filter_map(|value| {
                    let mut wanted: Vec<SelectedOption> = selected
                        .map(|v| v.selected_options.clone())
                        .unwrap_or_default();
                    match wanted.iter_mut().find(|o| o.name == option.name) {
                        Some(existing) => existing.value = value.clone(),
                        None => wanted.push(SelectedOption::new(option.name.clone(), value.clone())),
                    }

                    let candidate = product.find_variant(&wanted);
                    let available = candidate.is_some_and(|v| v.available_for_sale);
                    if hide_unavailable && !available {
                        return None;
                    }

                    let mut link_query = query.clone();
                    match candidate {
                        Some(variant) => sync_query(variant, &mut link_query),
                        None => link_query.set(option.name.clone(), value.clone()),
                    }

                    Some(OptionValueLink {
                        value: value.clone(),
                        href: link_query.to_url(path),
                        selected: current == Some(value.as_str()),
                        available,
                    })
                })
                .collect();

            OptionGroup {
                name: option.name.clone(),
                values,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{product, variant};

    #[test]
    fn test_server_default_then_url() {
        let product = product();
        let selection = VariantSelection::new(&product);
        assert_eq!(selection.source(), SelectionSource::ServerDefault);
        assert_eq!(selection.variant_id(), Some(&VariantId::from_legacy(11)));

        let query = QueryString::parse("Color=Blue&Size=M&utm_source=mail");
        let selection = VariantSelection::from_query(&product, &query);
        assert_eq!(selection.source(), SelectionSource::Url);
        assert_eq!(selection.variant(&product).unwrap().title, "Blue / M");
    }

    #[test]
    fn test_partial_query_keeps_default() {
        let mut product = product();
        product.selected_variant = Some(variant(12, "Red", "M", true));

        let selection = VariantSelection::from_query(&product, &QueryString::parse("Color=Blue"));
        assert_eq!(selection.source(), SelectionSource::ServerDefault);
        assert_eq!(selection.variant_id(), Some(&VariantId::from_legacy(12)));
    }

    #[test]
    fn test_user_pick_outranks_later_url() {
        let product = product();
        let mut query = QueryString::new();
        let mut selection = VariantSelection::new(&product);

        selection.pick(&product, &VariantId::from_legacy(13), &mut query);
        assert_eq!(selection.source(), SelectionSource::User);

        let changed = selection.apply_query(&product, &QueryString::parse("Color=Red&Size=S"));
        assert!(!changed);
        assert_eq!(selection.variant_id(), Some(&VariantId::from_legacy(13)));
    }

    #[test]
    fn test_pick_replaces_query_params() {
        let product = product();
        let mut query = QueryString::parse("Color=Red&Size=S&page=2");
        let mut selection = VariantSelection::from_query(&product, &query);

        for id in [14, 12, 14] {
            selection.pick(&product, &VariantId::from_legacy(id), &mut query);
        }

        assert_eq!(query.get_all("Color"), ["Blue"]);
        assert_eq!(query.get_all("Size"), ["M"]);
        assert_eq!(query.to_url("/products/silk-dress"), "/products/silk-dress?Color=Blue&Size=M&page=2");
    }

    #[test]
    fn test_pick_unknown_variant() {
        let product = product();
        let mut query = QueryString::new();
        let mut selection = VariantSelection::new(&product);
        assert!(selection
            .pick(&product, &VariantId::from_legacy(99), &mut query)
            .is_none());
        assert!(query.is_empty());
        assert_eq!(selection.source(), SelectionSource::ServerDefault);
    }

    #[test]
    fn test_option_groups() {
        let product = product();
        let selected = product.variant(&VariantId::from_legacy(11));
        let query = QueryString::parse("Color=Red&Size=S");

        let groups = option_groups(&product, selected, "/products/silk-dress", &query, false);
        assert_eq!(groups.len(), 2);

        let colors = &groups[0];
        assert_eq!(colors.name, "Color");
        assert!(colors.values[0].selected);
        let blue = &colors.values[1];
        assert_eq!(blue.href, "/products/silk-dress?Color=Blue&Size=S");
        assert!(!blue.available);

        let hidden = option_groups(&product, selected, "/products/silk-dress", &query, true);
        assert_eq!(hidden[0].values.len(), 1);
    }
}
