//! # hm-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `hm-core` domain models.

use async_trait::async_trait;
use hm_core::models::{Product, TaxonomyEntry, TaxonomyKind};
use hm_core::traits::CatalogRepo;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::str::FromStr;
use tracing::info;
use uuid::Uuid;

/// Products reference taxonomy ids without a foreign key: deleting a wood
/// or item type leaves the reference dangling instead of cascading.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS wood_types (
        id          BLOB PRIMARY KEY,
        name        TEXT NOT NULL,
        sort_order  INTEGER NOT NULL DEFAULT 0,
        is_active   INTEGER NOT NULL DEFAULT 1,
        created_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS item_types (
        id          BLOB PRIMARY KEY,
        name        TEXT NOT NULL,
        sort_order  INTEGER NOT NULL DEFAULT 0,
        is_active   INTEGER NOT NULL DEFAULT 1,
        created_at  TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS products (
        id                BLOB PRIMARY KEY,
        name              TEXT NOT NULL,
        description       TEXT,
        materials         TEXT,
        dimensions        TEXT,
        weight            TEXT,
        care_instructions TEXT,
        price_cents       INTEGER NOT NULL DEFAULT 0 CHECK (price_cents >= 0),
        buy_url           TEXT,
        size_label        TEXT,
        wood_type_id      BLOB,
        item_type_id      BLOB,
        image_urls        TEXT NOT NULL DEFAULT '[]',
        image_url         TEXT,
        is_in_stock       INTEGER NOT NULL DEFAULT 1,
        sort_order        INTEGER NOT NULL DEFAULT 0,
        created_at        TEXT NOT NULL,
        updated_at        TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS admin_allowlist (
        email TEXT PRIMARY KEY
    )",
];

pub struct SqliteCatalogRepo {
    pool: SqlitePool,
}

impl SqliteCatalogRepo {
    /// Connects and creates the schema if needed.
    ///
    /// An in-memory database lives only as long as its connection, so those
    /// get a single connection that is never recycled.
    pub async fn new(database_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let repo = Self { pool };
        repo.migrate().await?;
        Ok(repo)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        info!("sqlite schema ready");
        Ok(())
    }
}

fn table(kind: TaxonomyKind) -> &'static str {
    match kind {
        TaxonomyKind::Wood => "wood_types",
        TaxonomyKind::Item => "item_types",
    }
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn row_to_entry(row: &SqliteRow) -> sqlx::Result<TaxonomyEntry> {
    Ok(TaxonomyEntry {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice()),
        name: row.try_get("name")?,
        sort_order: row.try_get("sort_order")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_product(row: &SqliteRow) -> anyhow::Result<Product> {
    let optional_id = |column: &str| -> sqlx::Result<Option<Uuid>> {
        Ok(row
            .try_get::<Option<Vec<u8>>, _>(column)?
            .map(|blob| blob_to_uuid(&blob)))
    };

    Ok(Product {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice()),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        materials: row.try_get("materials")?,
        dimensions: row.try_get("dimensions")?,
        weight: row.try_get("weight")?,
        care_instructions: row.try_get("care_instructions")?,
        price_cents: row.try_get("price_cents")?,
        buy_url: row.try_get("buy_url")?,
        size_label: row.try_get("size_label")?,
        wood_type_id: optional_id("wood_type_id")?,
        item_type_id: optional_id("item_type_id")?,
        image_urls: serde_json::from_str(&row.try_get::<String, _>("image_urls")?).unwrap_or_default(),
        image_url: row.try_get("image_url")?,
        is_in_stock: row.try_get("is_in_stock")?,
        sort_order: row.try_get("sort_order")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl CatalogRepo for SqliteCatalogRepo {
    async fn list_taxonomy(&self, kind: TaxonomyKind) -> anyhow::Result<Vec<TaxonomyEntry>> {
        let sql = format!(
            "SELECT id, name, sort_order, is_active, created_at FROM {} ORDER BY sort_order ASC, name ASC",
            table(kind)
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_entry).collect::<sqlx::Result<_>>()?)
    }

    async fn list_active_taxonomy(&self, kind: TaxonomyKind) -> anyhow::Result<Vec<TaxonomyEntry>> {
        let sql = format!(
            "SELECT id, name, sort_order, is_active, created_at FROM {} WHERE is_active = 1 ORDER BY sort_order ASC, name ASC",
            table(kind)
        );
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_entry).collect::<sqlx::Result<_>>()?)
    }

    async fn create_taxonomy(&self, kind: TaxonomyKind, entry: TaxonomyEntry) -> anyhow::Result<()> {
        let sql = format!(
            "INSERT INTO {} (id, name, sort_order, is_active, created_at) VALUES (?, ?, ?, ?, ?)",
            table(kind)
        );
        sqlx::query(&sql)
            .bind(uuid_to_blob(entry.id))
            .bind(entry.name)
            .bind(entry.sort_order)
            .bind(entry.is_active)
            .bind(entry.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_taxonomy(&self, kind: TaxonomyKind, entry: TaxonomyEntry) -> anyhow::Result<bool> {
        let sql = format!(
            "UPDATE {} SET name = ?, sort_order = ?, is_active = ? WHERE id = ?",
            table(kind)
        );
        let result = sqlx::query(&sql)
            .bind(entry.name)
            .bind(entry.sort_order)
            .bind(entry.is_active)
            .bind(uuid_to_blob(entry.id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_taxonomy(&self, kind: TaxonomyKind, id: Uuid) -> anyhow::Result<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", table(kind));
        let result = sqlx::query(&sql)
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query("SELECT * FROM products ORDER BY sort_order ASC, created_at DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(row_to_product).collect()
    }

    async fn get_product(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_product).transpose()
    }

    async fn create_product(&self, product: Product) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO products (id, name, description, materials, dimensions, weight, care_instructions, \
             price_cents, buy_url, size_label, wood_type_id, item_type_id, image_urls, image_url, \
             is_in_stock, sort_order, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(product.id))
        .bind(product.name)
        .bind(product.description)
        .bind(product.materials)
        .bind(product.dimensions)
        .bind(product.weight)
        .bind(product.care_instructions)
        .bind(product.price_cents.max(0))
        .bind(product.buy_url)
        .bind(product.size_label)
        .bind(product.wood_type_id.map(uuid_to_blob))
        .bind(product.item_type_id.map(uuid_to_blob))
        .bind(serde_json::to_string(&product.image_urls)?)
        .bind(product.image_url)
        .bind(product.is_in_stock)
        .bind(product.sort_order)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replaces every editable column; `created_at` is kept from the original row.
    async fn update_product(&self, product: Product) -> anyhow::Result<bool> {
        let result = sqlx::query(
            "UPDATE products SET name = ?, description = ?, materials = ?, dimensions = ?, weight = ?, \
             care_instructions = ?, price_cents = ?, buy_url = ?, size_label = ?, wood_type_id = ?, \
             item_type_id = ?, image_urls = ?, image_url = ?, is_in_stock = ?, sort_order = ?, \
             updated_at = ? WHERE id = ?",
        )
        .bind(product.name)
        .bind(product.description)
        .bind(product.materials)
        .bind(product.dimensions)
        .bind(product.weight)
        .bind(product.care_instructions)
        .bind(product.price_cents.max(0))
        .bind(product.buy_url)
        .bind(product.size_label)
        .bind(product.wood_type_id.map(uuid_to_blob))
        .bind(product.item_type_id.map(uuid_to_blob))
        .bind(serde_json::to_string(&product.image_urls)?)
        .bind(product.image_url)
        .bind(product.is_in_stock)
        .bind(product.sort_order)
        .bind(product.updated_at)
        .bind(uuid_to_blob(product.id))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_product(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_admin_email(&self, email: &str) -> anyhow::Result<bool> {
        let row = sqlx::query("SELECT email FROM admin_allowlist WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn add_admin_email(&self, email: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT OR IGNORE INTO admin_allowlist (email) VALUES (?)")
            .bind(normalize_email(email))
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
