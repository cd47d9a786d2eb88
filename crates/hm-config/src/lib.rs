//! # hm-config
//!
//! Layered settings for the Haymarket server, lowest priority first:
//! built-in defaults, `config/default.*`, `config/local.*`, then environment
//! variables such as `HAYMARKET__SERVER__PORT=8080` (a `.env` file is read
//! into the environment first).

use std::path::PathBuf;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};
use thiserror::Error;
use tracing::warn;

const DEV_SECRET: &str = "dev-only-not-for-production";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    /// development | production
    pub environment: String,
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub storage: StorageSettings,
    pub auth: AuthSettings,
    pub contact: ContactSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// e.g. `sqlite:haymarket.db` or `sqlite::memory:`
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Base URL that storage-relative image paths are resolved against
    pub public_base_url: String,
    /// Where admin uploads are written
    pub upload_dir: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthSettings {
    #[serde(deserialize_with = "deserialize_secret")]
    pub secret: SecretString,
    pub login_token_ttl_minutes: i64,
    pub session_ttl_hours: i64,
    /// Public origin used to build magic links, e.g. `https://haymarketwoodshop.com`
    pub site_url: String,
    /// Added to the admin allowlist at startup
    #[serde(default)]
    pub seed_admin_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContactSettings {
    pub to_email: String,
    pub from_email: String,
    pub max_requests: u32,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    pub format: LogFormat,
    /// `EnvFilter` directive used when `RUST_LOG` is not set
    pub filter: String,
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl Settings {
    /// Reads `.env`, config files and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Some(e) = dotenv_failure(dotenvy::dotenv()) {
            warn!(error = %e, "ignoring unreadable .env file");
        }

        let config = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            .add_source(
                Environment::with_prefix("HAYMARKET")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        Self::from_config(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        Config::builder()
            .set_default("environment", "development")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("database.url", "sqlite:haymarket.db")?
            .set_default("storage.public_base_url", "/uploads")?
            .set_default("storage.upload_dir", "./data/uploads")?
            .set_default("auth.secret", DEV_SECRET)?
            .set_default("auth.login_token_ttl_minutes", 15)?
            .set_default("auth.session_ttl_hours", 168)?
            .set_default("auth.site_url", "http://127.0.0.1:8080")?
            .set_default("contact.to_email", "hello@haymarketwoodshop.com")?
            .set_default("contact.from_email", "website@haymarketwoodshop.com")?
            .set_default("contact.max_requests", 3)?
            .set_default("contact.window_seconds", 60)?
            .set_default("log.format", "pretty")?
            .set_default("log.filter", "haymarket=info,hm_api=info,hm_core=info,tower_http=info")
    }

    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid("server.port must be non-zero".into()));
        }
        if self.auth.login_token_ttl_minutes <= 0 || self.auth.session_ttl_hours <= 0 {
            return Err(ConfigError::Invalid("auth token lifetimes must be positive".into()));
        }
        if self.contact.max_requests == 0 || self.contact.window_seconds == 0 {
            return Err(ConfigError::Invalid("contact rate limit must be positive".into()));
        }

        let secret = self.auth.secret.expose_secret();
        if self.is_production() && (secret == DEV_SECRET || secret.len() < 32) {
            return Err(ConfigError::Invalid(
                "auth.secret must be set to at least 32 characters in production".into(),
            ));
        }
        if secret == DEV_SECRET {
            warn!("using the development auth secret");
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// A missing `.env` is normal; anything else is worth reporting.
fn dotenv_failure(loaded: Result<PathBuf, dotenvy::Error>) -> Option<dotenvy::Error> {
    loaded.err().filter(|e| !e.not_found())
}
