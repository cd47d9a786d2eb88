//! # Public routes
//!
//! Gallery and product pages, the read-only JSON API and the contact form.

use askama::Template;
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use hm_core::catalog::load_catalog;
use hm_core::contact::ContactForm;
use hm_core::filters::FilterSelection;
use hm_core::models::{TaxonomyEntry, TaxonomyKind};
use hm_core::projection::DisplayProduct;
use hm_core::AppError;
use hm_ui::{ContactTemplate, GalleryTemplate, NotFoundTemplate, ProductTemplate};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::rate_limit::client_key;
use crate::state::AppState;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn home() -> Redirect {
    Redirect::to("/gallery")
}

pub async fn gallery_page(State(state): State<AppState>, RawQuery(query): RawQuery) -> ApiResult<Html<String>> {
    let selection = FilterSelection::decode(query.as_deref().unwrap_or_default());
    let catalog = load_catalog(state.repo.as_ref(), state.media.as_ref()).await;
    render(&GalleryTemplate::new(&catalog, &selection))
}

pub async fn product_page(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Response> {
    let Ok(id) = Uuid::parse_str(&id) else {
        return not_found_page("That product does not exist.");
    };

    let catalog = load_catalog(state.repo.as_ref(), state.media.as_ref()).await;
    match catalog.find(id) {
        Some(product) => Ok(render(&ProductTemplate::new(product))?.into_response()),
        None => not_found_page("That product does not exist or has been removed."),
    }
}

pub async fn contact_page() -> ApiResult<Html<String>> {
    render(&ContactTemplate::default())
}

pub async fn not_found() -> ApiResult<Response> {
    not_found_page("We couldn't find the page you were looking for.")
}

/// Products visible under the selection in the query string.
pub async fn list_products(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<Vec<DisplayProduct>> {
    let selection = FilterSelection::decode(query.as_deref().unwrap_or_default());
    let catalog = load_catalog(state.repo.as_ref(), state.media.as_ref()).await;
    Json(catalog.gallery(&selection).products)
}

/// Active entries of one taxonomy table.
pub async fn list_taxonomy(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Json<Vec<TaxonomyEntry>>> {
    let kind: TaxonomyKind = kind.parse()?;
    Ok(Json(state.repo.list_active_taxonomy(kind).await?))
}

pub async fn submit_contact(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(form): Json<ContactForm>,
) -> ApiResult<Json<Value>> {
    let client = client_key(&headers);
    if !state.contact_limiter.check(&client) {
        warn!(client = %client, "contact form rate limited");
        return Err(AppError::RateLimitExceeded("please wait a minute before sending another message".into()).into());
    }

    form.check()?;

    if form.is_spam() {
        info!(client = %client, "discarding contact submission with filled honeypot");
        return Ok(Json(json!({ "success": true })));
    }

    let email = form.to_email(&state.site.contact_to, &state.site.contact_from);
    if let Err(e) = state.mailer.send(email).await {
        error!(error = %e, "failed to relay contact message");
        return Err(AppError::Internal("failed to send message".into()).into());
    }

    info!(client = %client, "contact message relayed");
    Ok(Json(json!({ "success": true })))
}

pub(crate) fn render(template: &impl Template) -> ApiResult<Html<String>> {
    template
        .render()
        .map(Html)
        .map_err(|e| AppError::Internal(format!("template rendering failed: {e}")).into())
}

fn not_found_page(message: &str) -> ApiResult<Response> {
    let page = render(&NotFoundTemplate::new(message))?;
    Ok((StatusCode::NOT_FOUND, page).into_response())
}
