//! Bundle products and the rule that collapses their component lines.

use std::collections::HashSet;

use serde::Deserialize;

use crate::orders::types::LineItem;

/// Bundles sold through the gateway at the time of writing.
pub const DEFAULT_BUNDLE_PRODUCTS: &[&str] = &[
    "Afrikaans Huistaal Gr. 10 Oefenvraestelle 2022–2024 (Junie & November)",
    "Afrikaans Huistaal Gr. 11 Oefenvraestelle 2023 & 2024 (Junie & November)",
    "Afrikaans Huistaal Gr. 12 Oefenvraestelle 2023 & 2024 (Junie & September)",
    "Afrikaans EAT Gr. 10 Oefenvraestelle 2021–2024 (Junie & November)",
    "Afrikaans EAT Gr. 11 Oefenvraestelle 2023 & 2024 (Junie & November)",
    "Afrikaans EAT Gr. 12 Oefenvraestelle 2023 & 2024 (Junie & September)",
];

/// Product names that stand for a bundle of other products.
///
/// Matching is exact string equality: no trimming, no case folding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct BundleCatalog {
    names: HashSet<String>,
}

impl BundleCatalog {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Catalog of [`DEFAULT_BUNDLE_PRODUCTS`].
    pub fn builtin() -> Self {
        Self::new(DEFAULT_BUNDLE_PRODUCTS.iter().copied())
    }

    pub fn contains(&self, product_name: &str) -> bool {
        self.names.contains(product_name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Apply the bundle rule to one order's line items.
///
/// When any item is a bundle, only bundle items are kept and every other
/// line is dropped, products unrelated to the bundle included. Without a
/// bundle the items pass through as-is.
pub fn collapse(items: Vec<LineItem>, catalog: &BundleCatalog) -> Vec<LineItem> {
    let has_bundle = items.iter().any(|item| catalog.contains(&item.product_name));
    if !has_bundle {
        return items;
    }
    items
        .into_iter()
        .filter(|item| catalog.contains(&item.product_name))
        .collect()
}
