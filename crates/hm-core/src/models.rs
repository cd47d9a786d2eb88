//! # Domain Models
//!
//! Stored catalog records, the admin payloads that produce them, and the
//! closed vocabularies the gallery filters are built from.
//! Ids are UUID v7 so rows created later sort later.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;
use crate::money::parse_price_to_cents;

/// Which lookup table a taxonomy entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    Wood,
    Item,
}

impl TaxonomyKind {
    pub const ALL: [TaxonomyKind; 2] = [TaxonomyKind::Wood, TaxonomyKind::Item];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaxonomyKind::Wood => "wood",
            TaxonomyKind::Item => "item",
        }
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaxonomyKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wood" => Ok(TaxonomyKind::Wood),
            "item" => Ok(TaxonomyKind::Item),
            other => Err(AppError::NotFound("taxonomy".into(), other.to_string())),
        }
    }
}

/// A wood type or item type. Both tables share this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    pub id: Uuid,
    /// Display name, unique in practice but not enforced
    pub name: String,
    pub sort_order: i32,
    /// Inactive entries are hidden from the filter UI but still name old products
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Admin payload for creating or editing a taxonomy entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxonomyDraft {
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl TaxonomyDraft {
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError("name is required".into()));
        }
        // Names travel as one comma-separated URL value in the gallery filters
        if self.name.contains(',') {
            return Err(AppError::ValidationError("name must not contain a comma".into()));
        }
        Ok(())
    }

    pub fn into_entry(self, id: Uuid, created_at: DateTime<Utc>) -> TaxonomyEntry {
        TaxonomyEntry {
            id,
            name: self.name.trim().to_string(),
            sort_order: self.sort_order,
            is_active: self.is_active,
            created_at,
        }
    }
}

/// A sellable item exactly as stored. Every optional column may be missing;
/// `projection::project` turns this into a fully defaulted display record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub materials: Option<String>,
    pub dimensions: Option<String>,
    /// Free text, e.g. "about 12 lbs"
    pub weight: Option<String>,
    pub care_instructions: Option<String>,
    /// Price in cents
    pub price_cents: i64,
    pub buy_url: Option<String>,
    /// Free-text size, parsed into `Size` at projection time
    pub size_label: Option<String>,
    pub wood_type_id: Option<Uuid>,
    pub item_type_id: Option<Uuid>,
    /// Ordered image references; the first one is the cover.
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Single-image column used by older rows. Ignored when `image_urls` has entries.
    pub image_url: Option<String>,
    pub is_in_stock: bool,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin payload for creating or replacing a product.
///
/// Price may be given either as `price_cents` or as a dollar string in
/// `price` (what the admin form sends). Blank text fields are stored as null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    pub description: Option<String>,
    pub materials: Option<String>,
    pub dimensions: Option<String>,
    pub weight: Option<String>,
    pub care_instructions: Option<String>,
    pub price: Option<String>,
    pub price_cents: Option<i64>,
    pub buy_url: Option<String>,
    pub size_label: Option<String>,
    pub wood_type_id: Option<Uuid>,
    pub item_type_id: Option<Uuid>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    pub image_url: Option<String>,
    #[serde(default = "default_true")]
    pub is_in_stock: bool,
    #[serde(default)]
    pub sort_order: i32,
}

impl ProductDraft {
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::ValidationError("name is required".into()));
        }
        Ok(())
    }

    pub fn resolved_price_cents(&self) -> i64 {
        match (self.price_cents, self.price.as_deref()) {
            (Some(cents), _) => cents.max(0),
            (None, Some(text)) => parse_price_to_cents(text),
            (None, None) => 0,
        }
    }

    pub fn into_product(self, id: Uuid, now: DateTime<Utc>) -> Product {
        let price_cents = self.resolved_price_cents();
        Product {
            id,
            name: self.name.trim().to_string(),
            description: blank_to_none(self.description),
            materials: blank_to_none(self.materials),
            dimensions: blank_to_none(self.dimensions),
            weight: blank_to_none(self.weight),
            care_instructions: blank_to_none(self.care_instructions),
            price_cents,
            buy_url: blank_to_none(self.buy_url),
            size_label: blank_to_none(self.size_label),
            wood_type_id: self.wood_type_id,
            item_type_id: self.item_type_id,
            image_urls: self
                .image_urls
                .into_iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            image_url: blank_to_none(self.image_url),
            is_in_stock: self.is_in_stock,
            sort_order: self.sort_order,
            created_at: now,
            updated_at: now,
        }
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn default_true() -> bool {
    true
}

/// Gallery size buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Size {
    Small,
    Medium,
    Large,
}

impl Size {
    pub const ALL: [Size; 3] = [Size::Small, Size::Medium, Size::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            Size::Small => "small",
            Size::Medium => "medium",
            Size::Large => "large",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Size::Small => "Small",
            Size::Medium => "Medium",
            Size::Large => "Large",
        }
    }

    /// Exact URL token match.
    pub fn from_token(token: &str) -> Option<Size> {
        Size::ALL.into_iter().find(|s| s.as_str() == token)
    }

    /// Lenient match for the stored free-text size label.
    pub fn from_label(label: &str) -> Option<Size> {
        let label = label.trim();
        Size::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(label))
    }
}

/// The fixed set of item types the gallery knows how to filter by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemTypeKey {
    SmallGoods,
    Tables,
    Cabinets,
}

impl ItemTypeKey {
    pub const ALL: [ItemTypeKey; 3] = [
        ItemTypeKey::SmallGoods,
        ItemTypeKey::Tables,
        ItemTypeKey::Cabinets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemTypeKey::SmallGoods => "small_goods",
            ItemTypeKey::Tables => "tables",
            ItemTypeKey::Cabinets => "cabinets",
        }
    }

    pub fn from_token(token: &str) -> Option<ItemTypeKey> {
        ItemTypeKey::ALL.into_iter().find(|k| k.as_str() == token)
    }

    /// Maps an item-type display name ("Small Goods", "small-goods") to its key.
    pub fn from_name(name: &str) -> Option<ItemTypeKey> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '-' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();
        ItemTypeKey::from_token(&normalized)
    }
}

/// File extension for an accepted upload type, `None` for anything that is not a web image.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Outgoing mail handed to a `Mailer`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub from: String,
    pub reply_to: Option<String>,
    pub subject: String,
    pub body: String,
}
