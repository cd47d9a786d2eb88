//! # hm-auth-simple
//!
//! HMAC-SHA256 implementation of `AuthProvider`.
//! Handles passwordless admin login: a short-lived token travels in the
//! emailed link and is exchanged for a longer-lived session token.
//!
//! Token layout: `base64url(purpose|expires_unix|email).base64url(mac)`.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};
use hm_core::traits::AuthProvider;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use tracing::debug;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Purpose {
    Login,
    Session,
}

impl Purpose {
    fn as_str(&self) -> &'static str {
        match self {
            Purpose::Login => "login",
            Purpose::Session => "session",
        }
    }
}

pub struct SimpleAuthProvider {
    /// Signing key; rotating it invalidates every outstanding token
    secret: SecretString,
    login_ttl: Duration,
    session_ttl: Duration,
}

impl SimpleAuthProvider {
    pub fn new(secret: SecretString, login_ttl: Duration, session_ttl: Duration) -> Self {
        Self {
            secret,
            login_ttl,
            session_ttl,
        }
    }

    fn ttl(&self, purpose: Purpose) -> Duration {
        match purpose {
            Purpose::Login => self.login_ttl,
            Purpose::Session => self.session_ttl,
        }
    }

    fn signature(&self, payload: &[u8]) -> Option<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes()).ok()?;
        mac.update(payload);
        Some(mac)
    }

    fn issue_at(&self, purpose: Purpose, email: &str, now: DateTime<Utc>) -> String {
        let expires = (now + self.ttl(purpose)).timestamp();
        let payload = format!("{}|{}|{}", purpose.as_str(), expires, email.trim().to_lowercase());
        let Some(mac) = self.signature(payload.as_bytes()) else {
            return String::new();
        };
        format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload.as_bytes()),
            URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
        )
    }

    fn verify_at(&self, purpose: Purpose, token: &str, now: DateTime<Utc>) -> Option<String> {
        let (payload_b64, mac_b64) = token.trim().split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let tag = URL_SAFE_NO_PAD.decode(mac_b64).ok()?;

        if self.signature(&payload)?.verify_slice(&tag).is_err() {
            debug!("rejected token with bad signature");
            return None;
        }

        let payload = String::from_utf8(payload).ok()?;
        let mut parts = payload.splitn(3, '|');
        let (kind, expires, email) = (parts.next()?, parts.next()?, parts.next()?);

        if kind != purpose.as_str() {
            debug!(expected = purpose.as_str(), got = kind, "rejected token for wrong purpose");
            return None;
        }
        if expires.parse::<i64>().ok()? <= now.timestamp() {
            debug!("rejected expired token");
            return None;
        }
        Some(email.to_string())
    }
}

impl AuthProvider for SimpleAuthProvider {
    fn issue_login_token(&self, email: &str) -> String {
        self.issue_at(Purpose::Login, email, Utc::now())
    }

    fn verify_login_token(&self, token: &str) -> Option<String> {
        self.verify_at(Purpose::Login, token, Utc::now())
    }

    fn issue_session_token(&self, email: &str) -> String {
        self.issue_at(Purpose::Session, email, Utc::now())
    }

    fn verify_session_token(&self, token: &str) -> Option<String> {
        self.verify_at(Purpose::Session, token, Utc::now())
    }
}
