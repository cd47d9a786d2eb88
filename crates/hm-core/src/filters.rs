//! # Gallery filter selection and its URL form
//!
//! `FilterSelection` is what the visitor has narrowed the gallery down to.
//! It lives in the page URL under four keys:
//!
//! | key       | value                                  | default |
//! |-----------|----------------------------------------|---------|
//! | `inStock` | `0` shows sold-out items too           | absent (in stock only) |
//! | `type`    | comma list of `small_goods,tables,cabinets` | absent |
//! | `size`    | one of `small`, `medium`, `large`      | absent  |
//! | `wood`    | comma list of wood type names          | absent  |
//!
//! Only non-default fields are written, so the default selection encodes to
//! an empty string. Decoding never fails: unknown keys are ignored and bad
//! values fall back to the field default.

use indexmap::IndexSet;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Serialize;

use crate::models::{ItemTypeKey, Size};

pub const PARAM_IN_STOCK: &str = "inStock";
pub const PARAM_TYPE: &str = "type";
pub const PARAM_SIZE: &str = "size";
pub const PARAM_WOOD: &str = "wood";

const IN_STOCK_OFF: &str = "0";
const LIST_SEPARATOR: char = ',';

/// Bytes `application/x-www-form-urlencoded` serializers leave as-is.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'*')
    .remove(b'-')
    .remove(b'.')
    .remove(b'_');

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    /// Hide sold-out products. On by default.
    pub in_stock_only: bool,
    /// Empty means no restriction.
    pub item_types: IndexSet<ItemTypeKey>,
    pub size: Option<Size>,
    /// Wood type names; matched case-insensitively. Empty means no restriction.
    pub wood_types: IndexSet<String>,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            in_stock_only: true,
            item_types: IndexSet::new(),
            size: None,
            wood_types: IndexSet::new(),
        }
    }
}

impl FilterSelection {
    /// Reads a selection from a query string, with or without the leading `?`.
    pub fn decode(query: &str) -> Self {
        let params = QueryParams::parse(query);

        let in_stock_only = params
            .get(PARAM_IN_STOCK)
            .map_or(true, |value| value != IN_STOCK_OFF);

        let item_types = params
            .get(PARAM_TYPE)
            .map(|value| split_list(value).filter_map(ItemTypeKey::from_token).collect())
            .unwrap_or_default();

        let size = params.get(PARAM_SIZE).and_then(Size::from_token);

        let wood_types = params
            .get(PARAM_WOOD)
            .map(|value| split_list(value).map(str::to_string).collect())
            .unwrap_or_default();

        Self {
            in_stock_only,
            item_types,
            size,
            wood_types,
        }
    }

    /// Shortest query string (no leading `?`) that decodes back to `self`.
    pub fn encode(&self) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::with_capacity(4);

        if !self.in_stock_only {
            pairs.push((PARAM_IN_STOCK, IN_STOCK_OFF.to_string()));
        }
        if !self.item_types.is_empty() {
            let joined = self
                .item_types
                .iter()
                .map(ItemTypeKey::as_str)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push((PARAM_TYPE, joined));
        }
        if let Some(size) = self.size {
            pairs.push((PARAM_SIZE, size.as_str().to_string()));
        }
        if !self.wood_types.is_empty() {
            let joined = self
                .wood_types
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(",");
            pairs.push((PARAM_WOOD, joined));
        }

        pairs
            .iter()
            .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, QUERY_VALUE)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// `""` for the default selection, otherwise `?` followed by `encode()`.
    pub fn to_query_suffix(&self) -> String {
        let query = self.encode();
        if query.is_empty() {
            query
        } else {
            format!("?{query}")
        }
    }

    /// Showing sold-out items counts as one; every other selected value counts once.
    pub fn count_active(&self) -> usize {
        usize::from(!self.in_stock_only)
            + self.item_types.len()
            + usize::from(self.size.is_some())
            + self.wood_types.len()
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn cleared(&self) -> Self {
        Self::default()
    }

    pub fn with_in_stock_only(&self, in_stock_only: bool) -> Self {
        Self {
            in_stock_only,
            ..self.clone()
        }
    }

    pub fn toggle_item_type(&self, key: ItemTypeKey) -> Self {
        let mut next = self.clone();
        if !next.item_types.shift_remove(&key) {
            next.item_types.insert(key);
        }
        next
    }

    /// Picking the already-selected size clears it.
    pub fn with_size(&self, size: Size) -> Self {
        let size = if self.size == Some(size) { None } else { Some(size) };
        Self {
            size,
            ..self.clone()
        }
    }

    pub fn has_wood_type(&self, name: &str) -> bool {
        self.wood_types.iter().any(|w| eq_folded(w, name))
    }

    /// Names that could not survive the URL form (blank, or containing the
    /// list separator) leave the selection unchanged.
    pub fn toggle_wood_type(&self, name: &str) -> Self {
        let mut next = self.clone();
        let name = name.trim();
        if name.is_empty() || name.contains(LIST_SEPARATOR) {
            return next;
        }
        if next.has_wood_type(name) {
            next.wood_types.retain(|w| !eq_folded(w, name));
        } else {
            next.wood_types.insert(name.to_string());
        }
        next
    }
}

pub(crate) fn eq_folded(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn split_list(value: &str) -> impl Iterator<Item = &str> {
    value
        .split(LIST_SEPARATOR)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Decoded `key=value` pairs in their original order.
struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let pairs = query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                (decode_component(key), decode_component(value))
            })
            .collect();
        Self(pairs)
    }

    /// First value for `key`, like `URLSearchParams.get`.
    fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
