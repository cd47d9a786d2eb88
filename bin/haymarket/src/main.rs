//! # Haymarket Binary
//!
//! The entry point that assembles the application based on compile-time features.

#[cfg(not(all(
    feature = "db-sqlite",
    feature = "storage-local",
    feature = "auth-simple",
    feature = "mail-log"
)))]
compile_error!("enable one implementation per port: db-sqlite, storage-local, auth-simple and mail-log");

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use hm_api::rate_limit::RateLimiter;
use hm_api::{AppState, SiteSettings};
use hm_config::{LogFormat, LogSettings, Settings};
use hm_core::traits::CatalogRepo;
use secrecy::{ExposeSecret, SecretString};
use tower_http::services::ServeDir;
use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

// Feature-gated imports
#[cfg(feature = "db-sqlite")]
use hm_db_sqlite::SqliteCatalogRepo;

#[cfg(feature = "storage-local")]
use hm_storage_local::LocalMediaStore;

#[cfg(feature = "auth-simple")]
use hm_auth_simple::SimpleAuthProvider;

#[cfg(feature = "mail-log")]
use hm_mail_log::LogMailer;

const STATIC_DIR: &str = "static";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("failed to load settings")?;
    init_tracing(&settings.log);
    info!(environment = %settings.environment, "starting haymarket");

    // 1. Database
    let repo = Arc::new(
        SqliteCatalogRepo::new(&settings.database.url)
            .await
            .context("failed to open the catalog database")?,
    );
    if let Some(email) = settings.auth.seed_admin_email.as_deref() {
        repo.add_admin_email(email).await?;
        info!(email = %email, "admin email allowlisted");
    }

    // 2. Storage
    let upload_dir = PathBuf::from(&settings.storage.upload_dir);
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .with_context(|| format!("failed to create {}", upload_dir.display()))?;
    let media = Arc::new(LocalMediaStore::new(upload_dir.clone(), &settings.storage.public_base_url));

    // 3. Auth
    let auth = Arc::new(SimpleAuthProvider::new(
        SecretString::from(settings.auth.secret.expose_secret().to_owned()),
        chrono::Duration::minutes(settings.auth.login_token_ttl_minutes),
        chrono::Duration::hours(settings.auth.session_ttl_hours),
    ));

    // 4. Mail
    let mailer = Arc::new(LogMailer::new());

    let contact_limiter = Arc::new(RateLimiter::new(
        settings.contact.max_requests,
        Duration::from_secs(settings.contact.window_seconds),
    ));
    spawn_limiter_cleanup(contact_limiter.clone());

    let state = AppState {
        repo,
        media,
        auth,
        mailer,
        site: Arc::new(SiteSettings {
            site_url: settings.auth.site_url.clone(),
            contact_to: settings.contact.to_email.clone(),
            contact_from: settings.contact.from_email.clone(),
        }),
        contact_limiter,
    };

    let mut app = hm_api::router(state).nest_service("/static", ServeDir::new(STATIC_DIR));
    let uploads_path = settings.storage.public_base_url.trim_end_matches('/');
    if uploads_path.starts_with('/') && uploads_path.len() > 1 {
        app = app.nest_service(uploads_path, ServeDir::new(&upload_dir));
    } else {
        warn!(base = %settings.storage.public_base_url, "uploads are expected to be served by an external host");
    }

    let address = settings.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind {address}"))?;
    info!("haymarket listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("haymarket stopped");
    Ok(())
}

fn init_tracing(log: &LogSettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);
    match log.format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

fn spawn_limiter_cleanup(limiter: Arc<RateLimiter>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(300));
        loop {
            interval.tick().await;
            limiter.cleanup();
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
