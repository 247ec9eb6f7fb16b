//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Store
//! See [`funda_store::StoreConfig`]: `FUNDA_STORE`, `DATABASE_URL`,
//! `FUNDA_REST_URL`, `FUNDA_REST_KEY`, `FUNDA_STORE_TIMEOUT_SECS`.
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_BASE_URL` - Public URL (default: http://localhost:3000)
//! - `STOREFRONT_CATALOG_TTL_SECS` - Homepage catalog cache lifetime (default: 60)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use funda_store::{StoreConfig, StoreConfigError};
use thiserror::Error;

const DEFAULT_CATALOG_TTL_SECS: u64 = 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error(transparent)]
    Store(#[from] StoreConfigError),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Public base URL; session cookies are `Secure` when it is https.
    pub base_url: String,
    pub store: StoreConfig,
    /// How long the homepage catalog is served from cache.
    pub catalog_ttl: Duration,
    pub sentry_dsn: Option<String>,
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if variables are invalid or the store settings
    /// are incomplete.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env("STOREFRONT_HOST", "127.0.0.1")?;
        let port = parse_env("STOREFRONT_PORT", "3000")?;
        let base_url = get_env_or_default("STOREFRONT_BASE_URL", "http://localhost:3000");
        let ttl_secs: u64 =
            parse_env("STOREFRONT_CATALOG_TTL_SECS", &DEFAULT_CATALOG_TTL_SECS.to_string())?;

        Ok(Self {
            host,
            port,
            base_url,
            store: StoreConfig::from_env()?,
            catalog_ttl: Duration::from_secs(ttl_secs),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn config(base_url: &str) -> StorefrontConfig {
        StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: base_url.to_string(),
            store: StoreConfig::Memory,
            catalog_ttl: Duration::from_secs(DEFAULT_CATALOG_TTL_SECS),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    #[test]
    fn test_socket_addr() {
        let addr = config("http://localhost:3000").socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_is_secure() {
        assert!(!config("http://localhost:3000").is_secure());
        assert!(config("https://funda.mx").is_secure());
    }

    #[test]
    fn test_parse_env_default() {
        let ttl: u64 = parse_env("FUNDA_TEST_UNSET_TTL", "60").unwrap();
        assert_eq!(ttl, 60);
        assert!(parse_env::<u16>("FUNDA_TEST_UNSET_PORT", "not-a-port").is_err());
    }
}
