use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use log::{info, warn};
use rand::RngCore;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Connection attempts before giving up at startup, `0` waits forever.
    pub database_wait_attempts: u32,
    pub secret_key: Vec<u8>,
    pub token_ttl_hours: i64,
    pub media_root: PathBuf,
    pub media_url: String,
    pub max_upload_bytes: u64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(|key| env::var(key).ok())
    }

    pub fn load_from<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret_key = match lookup("SECRET_KEY").filter(|secret| !secret.is_empty()) {
            Some(secret) => secret.into_bytes(),
            None => {
                warn!("SECRET_KEY not set, sessions will not survive a restart");
                let mut secret = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut secret);
                secret
            }
        };

        let mut media_url: String = try_load(&lookup, "MEDIA_URL", "/media/")?;
        if !media_url.ends_with('/') {
            media_url.push('/');
        }

        let config = Self {
            port: try_load(&lookup, "RECIPE_PORT", "8000")?,
            database_url: try_load(&lookup, "DATABASE_URL", "sqlite://recipes.db")?,
            database_max_connections: try_load(&lookup, "DATABASE_MAX_CONNECTIONS", "5")?,
            database_wait_attempts: try_load(&lookup, "DATABASE_WAIT_ATTEMPTS", "0")?,
            secret_key,
            token_ttl_hours: try_load(&lookup, "TOKEN_TTL_HOURS", "24")?,
            media_root: try_load(&lookup, "MEDIA_ROOT", "media")?,
            media_url,
            max_upload_bytes: try_load(&lookup, "MAX_UPLOAD_BYTES", "10485760")?,
        };

        if config.token_ttl_hours <= 0 {
            return Err(ConfigError::Invalid {
                key: "TOKEN_TTL_HOURS",
                reason: String::from("must be positive"),
            });
        }
        if config.database_max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_MAX_CONNECTIONS",
                reason: String::from("must be at least 1"),
            });
        }

        Ok(config)
    }

    /// Media path segment used for routing, e.g. `media` for `/media/`.
    pub fn media_prefix(&self) -> &str {
        self.media_url.trim_matches('/')
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("database_max_connections", &self.database_max_connections)
            .field("database_wait_attempts", &self.database_wait_attempts)
            .field("secret_key", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("media_root", &self.media_root)
            .field("media_url", &self.media_url)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

fn try_load<F, T>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}
