use askama::Template;
use hm_core::catalog::Catalog;
use hm_core::filters::FilterSelection;
use hm_core::models::{ItemTypeKey, Size};
use hm_core::projection::DisplayProduct;

const GALLERY_PATH: &str = "/gallery";

/// A sidebar option: following `href` toggles it.
pub struct FilterLink {
    pub label: String,
    pub href: String,
    pub active: bool,
}

pub struct ProductCard {
    pub href: String,
    pub name: String,
    pub subtitle: String,
    pub price: String,
    /// Empty when the product has no images
    pub image: String,
    pub sold_out: bool,
}

pub struct Detail {
    pub label: &'static str,
    pub value: String,
}

#[derive(Template)]
#[template(path = "gallery.html")]
pub struct GalleryTemplate {
    pub title: String,
    pub count_label: String,
    pub active_filters: usize,
    /// Empty while the selection is the default one
    pub clear_href: String,
    pub stock_link: FilterLink,
    pub item_type_links: Vec<FilterLink>,
    pub size_links: Vec<FilterLink>,
    pub wood_links: Vec<FilterLink>,
    pub cards: Vec<ProductCard>,
}

impl GalleryTemplate {
    pub fn new(catalog: &Catalog, selection: &FilterSelection) -> Self {
        let gallery = catalog.gallery(selection);

        let stock_link = FilterLink {
            label: "In stock only".to_string(),
            href: gallery_href(&selection.with_in_stock_only(!selection.in_stock_only)),
            active: selection.in_stock_only,
        };

        // Only active entries the filter vocabulary knows get a link, once per key
        let mut seen = Vec::new();
        let item_type_links = catalog
            .item_options
            .iter()
            .filter(|entry| entry.is_active)
            .filter_map(|entry| ItemTypeKey::from_name(&entry.name).map(|key| (key, entry)))
            .filter(|(key, _)| {
                let first = !seen.contains(key);
                seen.push(*key);
                first
            })
            .map(|(key, entry)| FilterLink {
                label: entry.name.clone(),
                href: gallery_href(&selection.toggle_item_type(key)),
                active: selection.item_types.contains(&key),
            })
            .collect();

        let size_links = Size::ALL
            .iter()
            .map(|size| FilterLink {
                label: size.label().to_string(),
                href: gallery_href(&selection.with_size(*size)),
                active: selection.size == Some(*size),
            })
            .collect();

        let wood_links = catalog
            .wood_options
            .iter()
            .map(|wood| FilterLink {
                label: wood.name.clone(),
                href: gallery_href(&selection.toggle_wood_type(&wood.name)),
                active: selection.has_wood_type(&wood.name),
            })
            .collect();

        let clear_href = if selection.is_default() {
            String::new()
        } else {
            gallery_href(&selection.cleared())
        };

        Self {
            title: "Gallery".to_string(),
            count_label: count_label(gallery.products.len()),
            active_filters: gallery.active_filters,
            clear_href,
            stock_link,
            item_type_links,
            size_links,
            wood_links,
            cards: gallery.products.iter().map(ProductCard::from).collect(),
        }
    }
}

impl From<&DisplayProduct> for ProductCard {
    fn from(product: &DisplayProduct) -> Self {
        let subtitle = [product.wood_type.as_str(), product.item_type.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" · ");

        Self {
            href: product_href(product),
            name: product.name.clone(),
            subtitle,
            price: product.price_label(),
            image: product.cover_image().unwrap_or_default().to_string(),
            sold_out: product.is_sold_out(),
        }
    }
}

#[derive(Template)]
#[template(path = "product.html")]
pub struct ProductTemplate {
    pub title: String,
    pub back_href: String,
    pub name: String,
    pub price: String,
    pub description: String,
    pub images: Vec<String>,
    pub details: Vec<Detail>,
    pub buy_url: String,
    pub sold_out: bool,
}

impl ProductTemplate {
    pub fn new(product: &DisplayProduct) -> Self {
        let details = [
            ("Wood", product.wood_type.clone()),
            ("Type", product.item_type.clone()),
            ("Size", product.size.map(|s| s.label().to_string()).unwrap_or_default()),
            ("Materials", product.materials.clone()),
            ("Dimensions", product.dimensions.clone()),
            ("Weight", product.weight.clone()),
            ("Care", product.care_instructions.clone()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(label, value)| Detail { label, value })
        .collect();

        Self {
            title: product.name.clone(),
            back_href: GALLERY_PATH.to_string(),
            name: product.name.clone(),
            price: product.price_label(),
            description: product.description.clone(),
            images: product.images.clone(),
            details,
            buy_url: product.buy_url.clone(),
            sold_out: product.is_sold_out(),
        }
    }
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {
    pub title: String,
    pub message: String,
}

impl NotFoundTemplate {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            title: "Not Found".to_string(),
            message: message.into(),
        }
    }
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    pub title: String,
    /// Endpoint the form posts JSON to
    pub action: String,
}

impl Default for ContactTemplate {
    fn default() -> Self {
        Self {
            title: "Contact".to_string(),
            action: "/api/contact".to_string(),
        }
    }
}

pub fn gallery_href(selection: &FilterSelection) -> String {
    format!("{GALLERY_PATH}{}", selection.to_query_suffix())
}

pub fn product_href(product: &DisplayProduct) -> String {
    format!("/products/{}", product.id)
}

fn count_label(count: usize) -> String {
    if count == 1 {
        "1 item".to_string()
    } else {
        format!("{count} items")
    }
}
