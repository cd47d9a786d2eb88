use std::sync::Arc;

use hm_core::traits::{AuthProvider, CatalogRepo, Mailer, MediaStore};

use crate::rate_limit::RateLimiter;

/// Addresses and origins the handlers need from configuration.
#[derive(Debug, Clone)]
pub struct SiteSettings {
    /// Public origin used in magic links
    pub site_url: String,
    pub contact_to: String,
    pub contact_from: String,
}

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn CatalogRepo>,
    pub media: Arc<dyn MediaStore>,
    pub auth: Arc<dyn AuthProvider>,
    pub mailer: Arc<dyn Mailer>,
    pub site: Arc<SiteSettings>,
    pub contact_limiter: Arc<RateLimiter>,
}
