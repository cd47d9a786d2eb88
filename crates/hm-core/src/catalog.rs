//! Loading the catalog for a page view.
//!
//! The two lookup tables and the product rows are fetched concurrently and
//! projected only once all three are in. A failed fetch becomes an empty
//! collection: empty lookups leave products unclassified and an empty
//! product list renders the "no results" state.

use tracing::{debug, warn};
use uuid::Uuid;

use crate::filters::FilterSelection;
use crate::models::{TaxonomyEntry, TaxonomyKind};
use crate::projection::{apply_filters, project, DisplayProduct, Lookup};
use crate::traits::{CatalogRepo, ImageResolver};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    /// Active wood types, for the filter sidebar
    pub wood_options: Vec<TaxonomyEntry>,
    /// Active item types, for the filter sidebar
    pub item_options: Vec<TaxonomyEntry>,
    /// Every product, in repository order
    pub products: Vec<DisplayProduct>,
}

/// What the gallery shows for one selection.
#[derive(Debug, Clone)]
pub struct Gallery {
    pub products: Vec<DisplayProduct>,
    pub active_filters: usize,
    pub total: usize,
}

pub async fn load_catalog<I: ImageResolver + ?Sized>(repo: &dyn CatalogRepo, images: &I) -> Catalog {
    let (woods, items, rows) = tokio::join!(
        repo.list_taxonomy(TaxonomyKind::Wood),
        repo.list_taxonomy(TaxonomyKind::Item),
        repo.list_products(),
    );

    let woods = or_empty(woods, "wood_types");
    let items = or_empty(items, "item_types");
    let rows = or_empty(rows, "products");

    let wood_lookup = Lookup::from_entries(&woods);
    let item_lookup = Lookup::from_entries(&items);
    let products: Vec<DisplayProduct> = rows
        .iter()
        .map(|row| project(row, &wood_lookup, &item_lookup, images))
        .collect();

    debug!(
        products = products.len(),
        wood_types = wood_lookup.len(),
        item_types = item_lookup.len(),
        "catalog loaded"
    );

    Catalog {
        wood_options: woods.into_iter().filter(|e| e.is_active).collect(),
        item_options: items.into_iter().filter(|e| e.is_active).collect(),
        products,
    }
}

fn or_empty<T>(fetched: anyhow::Result<Vec<T>>, resource: &str) -> Vec<T> {
    match fetched {
        Ok(rows) => rows,
        Err(e) => {
            warn!(resource, error = %e, "catalog fetch failed, continuing with an empty set");
            Vec::new()
        }
    }
}

impl Catalog {
    pub fn gallery(&self, selection: &FilterSelection) -> Gallery {
        Gallery {
            products: apply_filters(self.products.clone(), selection),
            active_filters: selection.count_active(),
            total: self.products.len(),
        }
    }

    pub fn find(&self, id: Uuid) -> Option<&DisplayProduct> {
        self.products.iter().find(|p| p.id == id)
    }
}
