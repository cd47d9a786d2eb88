//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{OutgoingEmail, Product, TaxonomyEntry, TaxonomyKind};

/// Data persistence contract for products, taxonomy tables and the admin allowlist.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CatalogRepo: Send + Sync {
    // Taxonomy Operations

    /// Every entry of `kind`, inactive ones included, by sort order then name.
    async fn list_taxonomy(&self, kind: TaxonomyKind) -> anyhow::Result<Vec<TaxonomyEntry>>;

    /// Entries shown as filter options.
    async fn list_active_taxonomy(&self, kind: TaxonomyKind) -> anyhow::Result<Vec<TaxonomyEntry>> {
        let mut entries = self.list_taxonomy(kind).await?;
        entries.retain(|e| e.is_active);
        Ok(entries)
    }

    async fn create_taxonomy(&self, kind: TaxonomyKind, entry: TaxonomyEntry) -> anyhow::Result<()>;
    /// Returns false when no entry has `entry.id`.
    async fn update_taxonomy(&self, kind: TaxonomyKind, entry: TaxonomyEntry) -> anyhow::Result<bool>;
    /// Never touches products that still reference `id`.
    async fn delete_taxonomy(&self, kind: TaxonomyKind, id: Uuid) -> anyhow::Result<bool>;

    // Product Operations

    /// All products by sort order, newest first within the same sort order.
    async fn list_products(&self) -> anyhow::Result<Vec<Product>>;
    async fn get_product(&self, id: Uuid) -> anyhow::Result<Option<Product>>;
    async fn create_product(&self, product: Product) -> anyhow::Result<()>;
    /// Returns false when no product has `product.id`.
    async fn update_product(&self, product: Product) -> anyhow::Result<bool>;
    async fn delete_product(&self, id: Uuid) -> anyhow::Result<bool>;

    // Admin Operations
    async fn is_admin_email(&self, email: &str) -> anyhow::Result<bool>;
    async fn add_admin_email(&self, email: &str) -> anyhow::Result<()>;
}

/// Turns a stored image reference into a URL a browser can fetch.
pub trait ImageResolver: Send + Sync {
    fn public_url(&self, reference: &str) -> String;
}

/// Media storage contract for admin uploads.
#[async_trait]
pub trait MediaStore: ImageResolver {
    /// Saves raw bytes and returns the storage-relative reference to keep on the product.
    async fn save_upload(&self, data: Vec<u8>, content_type: &str) -> anyhow::Result<String>;
}

/// Passwordless admin identity: magic-link login tokens and session tokens.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Short-lived token mailed to `email` inside the login link.
    fn issue_login_token(&self, email: &str) -> String;
    /// The email a valid, unexpired login token was issued for.
    fn verify_login_token(&self, token: &str) -> Option<String>;
    fn issue_session_token(&self, email: &str) -> String;
    fn verify_session_token(&self, token: &str) -> Option<String>;
}

/// Outbound email relay (magic links, contact form).
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()>;
}

/// Resolves references against a public object-storage base URL.
///
/// Absolute `http(s)://` references pass through untouched; anything else is
/// treated as a path inside the bucket.
#[derive(Debug, Clone)]
pub struct PublicBase {
    base: String,
}

impl PublicBase {
    pub fn new(base: impl Into<String>) -> Self {
        let base: String = base.into();
        Self {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.base
    }
}

impl ImageResolver for PublicBase {
    fn public_url(&self, reference: &str) -> String {
        let reference = reference.trim();
        if is_absolute_url(reference) {
            return reference.to_string();
        }
        format!("{}/{}", self.base, reference.trim_start_matches('/'))
    }
}

fn is_absolute_url(reference: &str) -> bool {
    let lower = reference.get(..8).unwrap_or(reference).to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_urls_pass_through() {
        let base = PublicBase::new("https://cdn.example.com/public/products/");
        assert_eq!(base.public_url("https://host/x.jpg"), "https://host/x.jpg");
        assert_eq!(base.public_url("HTTP://host/x.jpg"), "HTTP://host/x.jpg");
    }

    #[test]
    fn test_relative_paths_join_base() {
        let base = PublicBase::new("https://cdn.example.com/public/products/");
        assert_eq!(base.as_str(), "https://cdn.example.com/public/products");
        assert_eq!(
            base.public_url("tables/walnut.jpg"),
            "https://cdn.example.com/public/products/tables/walnut.jpg"
        );
        assert_eq!(
            base.public_url("/tables/walnut.jpg"),
            "https://cdn.example.com/public/products/tables/walnut.jpg"
        );
    }

    #[test]
    fn test_empty_base_yields_site_relative_path() {
        let base = PublicBase::new("");
        assert_eq!(base.public_url("a/b.png"), "/a/b.png");
    }
}
