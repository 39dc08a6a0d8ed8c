use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

const INSECURE_JWT_SECRET: &str = "default-insecure-key-change-this";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime settings, read once at startup from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub host: String,
    pub port: u16,
    /// Directory recipe images are written to
    pub media_root: PathBuf,
    /// URL prefix stored image paths are rendered under
    pub media_url: String,
    /// Default page size of paginated lists
    pub page_size: u64,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) => secret,
            Err(_) if cfg!(debug_assertions) => {
                warn!("JWT_SECRET not set, using an insecure development key");
                INSECURE_JWT_SECRET.to_string()
            }
            Err(_) => return Err(ConfigError::Missing("JWT_SECRET")),
        };

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_ttl_hours: try_load("JWT_TTL_HOURS", "24")?,
            host: try_load("HOST", "127.0.0.1")?,
            port: try_load("PORT", "8080")?,
            media_root: try_load("MEDIA_ROOT", "media")?,
            media_url: try_load("MEDIA_URL", "/media/")?,
            page_size: try_load("PAGE_SIZE", "6")?,
        })
    }

    /// Public URL of a stored media path
    pub fn media_link(&self, path: &str) -> String {
        format!("{}/{}", self.media_url.trim_end_matches('/'), path)
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        reason: e.to_string(),
        value,
    })
}
