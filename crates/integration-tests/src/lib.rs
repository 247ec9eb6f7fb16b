//! Integration tests for Funda.
//!
//! # Running Tests
//!
//! ```bash
//! # Store properties against the in-memory backend
//! cargo test -p funda-integration-tests
//!
//! # Against PostgreSQL and a running admin server
//! DATABASE_URL=postgres://... cargo test -p funda-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `repository_properties` - Repository, Bootstrapper and Aggregator behaviour
//! - `postgres_store` - The same flows against a real database
//! - `admin_http` - Admin screens over HTTP

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use funda_core::Seeded;
use funda_store::{MemoryStore, Repository, Store};

/// An in-memory store with every table created.
#[must_use]
pub fn memory_store() -> Arc<dyn Store> {
    Arc::new(MemoryStore::with_all_tables())
}

/// A repository over `store` with the dummy rows already inserted.
///
/// # Panics
///
/// When the insert fails; only for use in tests.
#[allow(clippy::expect_used)]
pub async fn seeded<E: Seeded>(store: &Arc<dyn Store>) -> Repository<E> {
    let repo = Repository::<E>::new(Arc::clone(store));
    repo.insert(&E::seed()).await.expect("seed insert failed");
    repo
}

/// Unique suffix so repeated runs against a shared database do not collide.
#[must_use]
pub fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4().simple())
}

/// Base URL for a running admin server.
#[must_use]
pub fn admin_base_url() -> String {
    std::env::var("ADMIN_BASE_URL").unwrap_or_else(|_| "http://localhost:3001".to_string())
}
