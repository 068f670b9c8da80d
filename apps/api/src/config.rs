use anyhow::{Context, Result};

use crate::features::FeatureFlags;
use crate::roles::cache::DEFAULT_KEY_PREFIX;
use crate::roles::registry::DEFAULT_IDLE_TTL;

/// Application configuration loaded from environment variables.
///
/// Only `PORT` and the `FEATURE_*` overrides are validated; the backing
/// services are optional and fall back to in-process implementations.
#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres for persisting role changes. Stub backend when unset.
    pub database_url: Option<String>,
    /// Redis for the role cache. In-process cache when unset.
    pub redis_url: Option<String>,
    pub role_cache_prefix: String,
    /// Seconds a user's role store may sit unused before it is dropped.
    pub role_store_idle_secs: u64,
    pub port: u16,
    pub rust_log: String,
    pub feature_flags: FeatureFlags,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: optional_env("DATABASE_URL"),
            redis_url: optional_env("REDIS_URL"),
            role_cache_prefix: optional_env("ROLE_CACHE_PREFIX")
                .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
            role_store_idle_secs: optional_env("ROLE_STORE_IDLE_SECS")
                .map(|v| v.trim().parse::<u64>())
                .transpose()
                .context("ROLE_STORE_IDLE_SECS must be a whole number of seconds")?
                .unwrap_or(DEFAULT_IDLE_TTL.as_secs()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            feature_flags: FeatureFlags::from_lookup(optional_env)
                .context("Invalid feature flag override")?,
        })
    }
}

/// Treats empty values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
