//! Store selection from environment variables.
//!
//! # Environment Variables
//!
//! - `FUNDA_STORE` - `postgres` (default), `rest` or `memory`
//! - `DATABASE_URL` - `PostgreSQL` connection string (postgres)
//! - `FUNDA_REST_URL` - Base URL of the hosted REST service (rest)
//! - `FUNDA_REST_KEY` - API key for the hosted REST service (rest)
//! - `FUNDA_STORE_TIMEOUT_SECS` - Per-call timeout (default: 15)
//!
//! Binaries call `dotenvy::dotenv()` before reading these.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

use crate::error::StoreError;
use crate::memory::MemoryStore;
use crate::postgres::PostgresStore;
use crate::rest::RestStore;
use crate::store::{Store, TimeoutStore};

const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

#[derive(Debug, Error)]
pub enum StoreConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Which store implementation to connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    Rest,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = StoreConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "rest" | "supabase" => Ok(Self::Rest),
            "memory" => Ok(Self::Memory),
            other => Err(StoreConfigError::InvalidEnvVar(
                "FUNDA_STORE".to_string(),
                format!("unknown store '{other}'"),
            )),
        }
    }
}

/// Connection settings for the selected store.
#[derive(Clone)]
pub enum StoreConfig {
    Postgres {
        database_url: SecretString,
        timeout: Duration,
    },
    Rest {
        base_url: Url,
        api_key: SecretString,
        timeout: Duration,
    },
    Memory,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Postgres { timeout, .. } => f
                .debug_struct("Postgres")
                .field("database_url", &"[REDACTED]")
                .field("timeout", timeout)
                .finish(),
            Self::Rest {
                base_url, timeout, ..
            } => f
                .debug_struct("Rest")
                .field("base_url", &base_url.as_str())
                .field("api_key", &"[REDACTED]")
                .field("timeout", timeout)
                .finish(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

impl StoreConfig {
    /// Read the store settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns `StoreConfigError` when the selected backend's variables are
    /// missing or malformed, or the REST key looks like a placeholder.
    pub fn from_env() -> Result<Self, StoreConfigError> {
        let backend = std::env::var("FUNDA_STORE")
            .ok()
            .map(|s| s.parse::<StoreBackend>())
            .transpose()?
            .unwrap_or_default();
        Self::for_backend(backend)
    }

    /// Read the settings for a specific backend.
    ///
    /// # Errors
    ///
    /// As for [`from_env`](Self::from_env).
    pub fn for_backend(backend: StoreBackend) -> Result<Self, StoreConfigError> {
        let timeout = timeout_from_env()?;
        match backend {
            StoreBackend::Postgres => Ok(Self::Postgres {
                database_url: SecretString::from(get_required_env("DATABASE_URL")?),
                timeout,
            }),
            StoreBackend::Rest => {
                let raw = get_required_env("FUNDA_REST_URL")?;
                let base_url = Url::parse(&raw).map_err(|e| {
                    StoreConfigError::InvalidEnvVar("FUNDA_REST_URL".to_string(), e.to_string())
                })?;
                let api_key = get_required_env("FUNDA_REST_KEY")?;
                reject_placeholder(&api_key, "FUNDA_REST_KEY")?;
                Ok(Self::Rest {
                    base_url,
                    api_key: SecretString::from(api_key),
                    timeout,
                })
            }
            StoreBackend::Memory => Ok(Self::Memory),
        }
    }

    #[must_use]
    pub const fn backend(&self) -> StoreBackend {
        match self {
            Self::Postgres { .. } => StoreBackend::Postgres,
            Self::Rest { .. } => StoreBackend::Rest,
            Self::Memory => StoreBackend::Memory,
        }
    }

    /// Connect the configured store, wrapped in the call timeout.
    ///
    /// The memory store starts with every table created so local demos
    /// work without a setup step.
    ///
    /// # Errors
    ///
    /// Returns the classified connection error.
    pub async fn connect(&self) -> Result<Arc<dyn Store>, StoreError> {
        let store: Arc<dyn Store> = match self {
            Self::Postgres {
                database_url,
                timeout,
            } => Arc::new(TimeoutStore::new(
                Arc::new(PostgresStore::connect(database_url).await?),
                *timeout,
            )),
            Self::Rest {
                base_url,
                api_key,
                timeout,
            } => Arc::new(TimeoutStore::new(
                Arc::new(RestStore::new(base_url.clone(), api_key)?),
                *timeout,
            )),
            Self::Memory => Arc::new(MemoryStore::with_all_tables()),
        };
        tracing::info!(backend = store.backend(), "store connected");
        Ok(store)
    }
}

fn get_required_env(key: &str) -> Result<String, StoreConfigError> {
    std::env::var(key).map_err(|_| StoreConfigError::MissingEnvVar(key.to_string()))
}

fn timeout_from_env() -> Result<Duration, StoreConfigError> {
    std::env::var("FUNDA_STORE_TIMEOUT_SECS").map_or(
        Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        |raw| {
            raw.parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or_else(|| {
                    StoreConfigError::InvalidEnvVar(
                        "FUNDA_STORE_TIMEOUT_SECS".to_string(),
                        format!("expected a positive number of seconds, got '{raw}'"),
                    )
                })
        },
    )
}

fn reject_placeholder(secret: &str, var_name: &str) -> Result<(), StoreConfigError> {
    if secret.trim().is_empty() {
        return Err(StoreConfigError::InsecureSecret(
            var_name.to_string(),
            "must not be empty".to_string(),
        ));
    }
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(**p)) {
        return Err(StoreConfigError::InsecureSecret(
            var_name.to_string(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }
    Ok(())
}
