//! Funda Store - data access for the four storefront tables.
//!
//! # Layers
//!
//! - [`Store`] - injected handle to the relational database, one
//!   implementation per backend ([`PostgresStore`], [`RestStore`],
//!   [`MemoryStore`]), optionally wrapped in a [`TimeoutStore`]
//! - [`Repository`] - typed list/filter/search/insert/update for one table,
//!   driven by the entity's static descriptor
//! - [`Bootstrapper`] - idempotent table creation
//! - [`StoreConfig`] - backend selection from the environment
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use funda_core::CaseRecord;
//! use funda_store::{MemoryStore, Repository};
//!
//! # async fn example() -> Result<(), funda_store::StoreError> {
//! let store = Arc::new(MemoryStore::with_all_tables());
//! let cases: Repository<CaseRecord> = Repository::new(store);
//! let iphone = cases.by_phone_model("iPhone 15").await?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod bootstrap;
mod config;
mod entities;
mod error;
mod memory;
mod postgres;
mod repository;
mod rest;
mod sequence;
mod store;

pub use bootstrap::{Bootstrap, Bootstrapper};
pub use config::{StoreBackend, StoreConfig, StoreConfigError};
pub use error::{SchemaError, StoreError};
pub use memory::MemoryStore;
pub use postgres::{PostgresStore, create_pool};
pub use repository::Repository;
pub use rest::RestStore;
pub use sequence::{BusyFlag, BusyGuard, RequestSequencer};
pub use store::{Assignment, Filter, Patch, Row, Select, Store, TimeoutStore};
