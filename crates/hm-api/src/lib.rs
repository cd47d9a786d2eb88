//! # hm-api
//!
//! The web routing and orchestration layer for the Haymarket Woodshop.

pub mod admin;
pub mod error;
pub mod middleware;
pub mod public;
pub mod rate_limit;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::{AppState, SiteSettings};

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

/// Largest accepted image upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Builds the full application router.
///
/// The binary may nest extra services (e.g. static uploads) on the result.
pub fn router(state: AppState) -> Router {
    let admin_api = Router::new()
        .route("/products", get(admin::list_products).post(admin::create_product))
        .route("/products/{id}", put(admin::update_product).delete(admin::delete_product))
        .route("/taxonomy/{kind}", get(admin::list_taxonomy).post(admin::create_taxonomy))
        .route(
            "/taxonomy/{kind}/{id}",
            put(admin::update_taxonomy).delete(admin::delete_taxonomy),
        )
        .route(
            "/uploads",
            post(admin::upload_image).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        );

    Router::new()
        .route("/health", get(public::health))
        .route("/", get(public::home))
        .route("/gallery", get(public::gallery_page))
        .route("/products/{id}", get(public::product_page))
        .route("/contact", get(public::contact_page))
        .route("/api/products", get(public::list_products))
        .route("/api/taxonomy/{kind}", get(public::list_taxonomy))
        .route("/api/contact", post(public::submit_contact))
        .route("/admin/login", post(admin::request_login))
        .route("/admin/verify", get(admin::verify_login))
        .nest("/admin/api", admin_api)
        .fallback(public::not_found)
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(middleware::nosniff())
        .layer(middleware::referrer_policy())
        .layer(middleware::cors_policy())
        .layer(middleware::trace_layer())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}
