//! # Product projection
//!
//! Stored `Product` rows reference their wood and item types by id and keep
//! images either as a list or, in older rows, a single column. `project`
//! resolves all of that once into a `DisplayProduct` with no optional text,
//! and `apply_filters` narrows a list of those by a `FilterSelection`.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::filters::{eq_folded, FilterSelection};
use crate::models::{ItemTypeKey, Product, Size, TaxonomyEntry};
use crate::money::{cents_to_decimal, format_price};
use crate::traits::ImageResolver;

/// Id -> name for one taxonomy table.
///
/// Built from every entry, inactive ones included, so old products keep
/// their names. When ids repeat, the last entry wins.
#[derive(Debug, Clone, Default)]
pub struct Lookup {
    names: HashMap<Uuid, String>,
}

impl Lookup {
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a TaxonomyEntry>) -> Self {
        entries
            .into_iter()
            .map(|entry| (entry.id, entry.name.clone()))
            .collect()
    }

    /// `""` for a null or dangling reference.
    pub fn name_of(&self, id: Option<Uuid>) -> &str {
        id.and_then(|id| self.names.get(&id))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<(Uuid, String)> for Lookup {
    fn from_iter<I: IntoIterator<Item = (Uuid, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

/// A product ready to render: names resolved, URLs absolute, no nulls.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayProduct {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub materials: String,
    pub dimensions: String,
    pub weight: String,
    pub care_instructions: String,
    /// Use this for comparisons; `price` is for display only.
    pub price_cents: i64,
    pub price: Decimal,
    pub buy_url: String,
    /// Empty when unclassified
    pub wood_type: String,
    /// Empty when unclassified
    pub item_type: String,
    pub size: Option<Size>,
    /// Fully-qualified URLs, cover first. May be empty.
    pub images: Vec<String>,
    pub in_stock: bool,
}

impl DisplayProduct {
    pub fn cover_image(&self) -> Option<&str> {
        self.images.first().map(String::as_str)
    }

    pub fn price_label(&self) -> String {
        format_price(self.price_cents)
    }

    pub fn is_sold_out(&self) -> bool {
        !self.in_stock
    }

    pub fn item_type_key(&self) -> Option<ItemTypeKey> {
        ItemTypeKey::from_name(&self.item_type)
    }
}

pub fn project<I: ImageResolver + ?Sized>(
    raw: &Product,
    woods: &Lookup,
    items: &Lookup,
    images: &I,
) -> DisplayProduct {
    let price_cents = raw.price_cents.max(0);

    DisplayProduct {
        id: raw.id,
        name: raw.name.clone(),
        description: text_or_empty(&raw.description),
        materials: text_or_empty(&raw.materials),
        dimensions: text_or_empty(&raw.dimensions),
        weight: text_or_empty(&raw.weight),
        care_instructions: text_or_empty(&raw.care_instructions),
        price_cents,
        price: cents_to_decimal(price_cents),
        buy_url: text_or_empty(&raw.buy_url),
        wood_type: woods.name_of(raw.wood_type_id).to_string(),
        item_type: items.name_of(raw.item_type_id).to_string(),
        size: raw.size_label.as_deref().and_then(Size::from_label),
        images: image_refs(raw)
            .into_iter()
            .map(|reference| images.public_url(reference))
            .collect(),
        in_stock: raw.is_in_stock,
    }
}

/// The image list wins when it has entries; otherwise the single column
/// becomes a one-element list.
fn image_refs(raw: &Product) -> Vec<&str> {
    let listed: Vec<&str> = raw
        .image_urls
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !listed.is_empty() {
        return listed;
    }

    raw.image_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .into_iter()
        .collect()
}

fn text_or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// Whether `product` survives `selection`.
pub fn matches(product: &DisplayProduct, selection: &FilterSelection) -> bool {
    if selection.in_stock_only && product.is_sold_out() {
        return false;
    }

    if !selection.item_types.is_empty() {
        let selected = product
            .item_type_key()
            .is_some_and(|key| selection.item_types.contains(&key));
        if !selected {
            return false;
        }
    }

    if let Some(size) = selection.size {
        if product.size != Some(size) {
            return false;
        }
    }

    if !selection.wood_types.is_empty() {
        if product.wood_type.is_empty() {
            return false;
        }
        let selected = selection
            .wood_types
            .iter()
            .any(|wood| eq_folded(wood, &product.wood_type));
        if !selected {
            return false;
        }
    }

    true
}

/// Keeps the products that match, in their original order.
pub fn apply_filters(products: Vec<DisplayProduct>, selection: &FilterSelection) -> Vec<DisplayProduct> {
    products
        .into_iter()
        .filter(|product| matches(product, selection))
        .collect()
}
