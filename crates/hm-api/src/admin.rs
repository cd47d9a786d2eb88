//! # Admin routes
//!
//! Passwordless login (magic link, then bearer session) and catalog CRUD.
//! Every `/admin/api` handler takes an [`AdminSession`], so a request without
//! a valid session for an allowlisted email never reaches the repository.

use axum::extract::{FromRequestParts, Multipart, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::Json;
use chrono::Utc;
use hm_core::models::{
    image_extension, OutgoingEmail, Product, ProductDraft, TaxonomyDraft, TaxonomyEntry, TaxonomyKind,
};
use hm_core::traits::ImageResolver;
use hm_core::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// An authenticated admin, extracted from `Authorization: Bearer <session>`.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub email: String,
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| AppError::Unauthorized("missing bearer token".into()))?;

        let email = state
            .auth
            .verify_session_token(token)
            .ok_or_else(|| AppError::Unauthorized("invalid or expired session".into()))?;

        if !state.repo.is_admin_email(&email).await? {
            warn!(email = %email, "session for an email no longer on the allowlist");
            return Err(AppError::Unauthorized("not an admin".into()).into());
        }

        Ok(AdminSession { email })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub email: String,
}

/// Mails a magic link when the email is allowlisted. Always 202.
pub async fn request_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<Value>) {
    let email = req.email.trim().to_lowercase();
    let accepted = (StatusCode::ACCEPTED, Json(json!({ "status": "check your inbox" })));

    match state.repo.is_admin_email(&email).await {
        Ok(true) => {}
        Ok(false) => {
            info!(email = %email, "login requested for unknown email");
            return accepted;
        }
        Err(e) => {
            error!(error = %e, "allowlist lookup failed");
            return accepted;
        }
    }

    let token = state.auth.issue_login_token(&email);
    let link = format!("{}/admin/verify?token={}", state.site.site_url.trim_end_matches('/'), token);
    let message = OutgoingEmail {
        to: email.clone(),
        from: state.site.contact_from.clone(),
        reply_to: None,
        subject: "Your Haymarket Woodshop admin login link".to_string(),
        body: format!("Use this link to sign in to the shop admin. It expires in a few minutes.\n\n{link}\n"),
    };

    if let Err(e) = state.mailer.send(message).await {
        error!(error = %e, "failed to send login link");
    } else {
        info!(email = %email, "login link sent");
    }
    accepted
}

/// Exchanges a login token for a session token.
pub async fn verify_login(
    State(state): State<AppState>,
    Query(params): Query<VerifyParams>,
) -> ApiResult<Json<SessionResponse>> {
    let email = state
        .auth
        .verify_login_token(&params.token)
        .ok_or_else(|| AppError::Unauthorized("invalid or expired login link".into()))?;

    if !state.repo.is_admin_email(&email).await? {
        return Err(AppError::Unauthorized("not an admin".into()).into());
    }

    info!(email = %email, "admin signed in");
    Ok(Json(SessionResponse {
        token: state.auth.issue_session_token(&email),
        email,
    }))
}

// Products

pub async fn list_products(_admin: AdminSession, State(state): State<AppState>) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.repo.list_products().await?))
}

pub async fn create_product(
    admin: AdminSession,
    State(state): State<AppState>,
    Json(draft): Json<ProductDraft>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    draft.validate()?;
    let product = draft.into_product(Uuid::now_v7(), Utc::now());
    state.repo.create_product(product.clone()).await?;

    info!(product_id = %product.id, admin = %admin.email, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(draft): Json<ProductDraft>,
) -> ApiResult<Json<Product>> {
    draft.validate()?;
    let existing = state
        .repo
        .get_product(id)
        .await?
        .ok_or_else(|| AppError::NotFound("product".into(), id.to_string()))?;

    let mut product = draft.into_product(id, Utc::now());
    product.created_at = existing.created_at;

    if !state.repo.update_product(product.clone()).await? {
        return Err(AppError::NotFound("product".into(), id.to_string()).into());
    }

    info!(product_id = %id, admin = %admin.email, "product updated");
    Ok(Json(product))
}

pub async fn delete_product(
    admin: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    if !state.repo.delete_product(id).await? {
        return Err(AppError::NotFound("product".into(), id.to_string()).into());
    }
    info!(product_id = %id, admin = %admin.email, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Taxonomy

pub async fn list_taxonomy(
    _admin: AdminSession,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Json<Vec<TaxonomyEntry>>> {
    let kind: TaxonomyKind = kind.parse()?;
    Ok(Json(state.repo.list_taxonomy(kind).await?))
}

pub async fn create_taxonomy(
    admin: AdminSession,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(draft): Json<TaxonomyDraft>,
) -> ApiResult<(StatusCode, Json<TaxonomyEntry>)> {
    let kind: TaxonomyKind = kind.parse()?;
    draft.validate()?;
    let entry = draft.into_entry(Uuid::now_v7(), Utc::now());
    state.repo.create_taxonomy(kind, entry.clone()).await?;

    info!(kind = %kind, entry_id = %entry.id, admin = %admin.email, "taxonomy entry created");
    Ok((StatusCode::CREATED, Json(entry)))
}

pub async fn update_taxonomy(
    admin: AdminSession,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
    Json(draft): Json<TaxonomyDraft>,
) -> ApiResult<Json<TaxonomyEntry>> {
    let kind: TaxonomyKind = kind.parse()?;
    draft.validate()?;

    // created_at is never rewritten by an update
    let entry = draft.into_entry(id, Utc::now());
    if !state.repo.update_taxonomy(kind, entry).await? {
        return Err(AppError::NotFound(kind.to_string(), id.to_string()).into());
    }

    let stored = state
        .repo
        .list_taxonomy(kind)
        .await?
        .into_iter()
        .find(|e| e.id == id)
        .ok_or_else(|| AppError::NotFound(kind.to_string(), id.to_string()))?;

    info!(kind = %kind, entry_id = %id, admin = %admin.email, "taxonomy entry updated");
    Ok(Json(stored))
}

pub async fn delete_taxonomy(
    admin: AdminSession,
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> ApiResult<StatusCode> {
    let kind: TaxonomyKind = kind.parse()?;
    if !state.repo.delete_taxonomy(kind, id).await? {
        return Err(AppError::NotFound(kind.to_string(), id.to_string()).into());
    }
    info!(kind = %kind, entry_id = %id, admin = %admin.email, "taxonomy entry deleted");
    Ok(StatusCode::NO_CONTENT)
}

// Uploads

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Storage-relative reference to put on a product
    pub reference: String,
    pub url: String,
}

/// Stores the first `file` field of a multipart body.
pub async fn upload_image(
    admin: AdminSession,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::ValidationError(format!("malformed upload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = field
            .content_type()
            .map(str::to_string)
            .or_else(|| {
                field
                    .file_name()
                    .and_then(|name| mime_guess::from_path(name).first_raw())
                    .map(str::to_string)
            })
            .unwrap_or_default();

        if image_extension(&content_type).is_none() {
            return Err(AppError::ValidationError(format!("unsupported image type: {content_type}")).into());
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::ValidationError(format!("malformed upload: {e}")))?;
        if data.is_empty() {
            return Err(AppError::ValidationError("empty upload".into()).into());
        }

        let reference = state.media.save_upload(data.to_vec(), &content_type).await?;
        let url = state.media.public_url(&reference);

        info!(reference = %reference, admin = %admin.email, "image uploaded");
        return Ok((StatusCode::CREATED, Json(UploadResponse { reference, url })));
    }

    Err(AppError::ValidationError("missing file field".into()).into())
}
