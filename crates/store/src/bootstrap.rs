//! Schema bootstrapping.
//!
//! Brings a table into existence from its static descriptor. The rendered
//! statement is idempotent, so running it against an existing table only
//! re-installs the `updated_at` trigger.

use std::sync::Arc;

use funda_core::TableSchema;
use funda_core::schema::all_tables;
use tracing::instrument;

use crate::error::{SchemaError, StoreError};
use crate::store::{Select, Store};

/// Outcome of [`Bootstrapper::ensure_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bootstrap {
    Created,
    AlreadyExisted,
}

/// Issues schema-definition statements through a store.
#[derive(Debug, Clone)]
pub struct Bootstrapper {
    store: Arc<dyn Store>,
}

impl Bootstrapper {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Whether `table` can be read.
    ///
    /// # Errors
    ///
    /// Any store failure other than a missing table.
    pub async fn table_exists(&self, table: &TableSchema) -> Result<bool, StoreError> {
        let first_row = Select::all(table.default_order).with_limit(1);
        match self.store.select(table, &first_row).await {
            Ok(_) => Ok(true),
            Err(StoreError::MissingTable(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Create `table` (columns, indexes and trigger) if it does not exist.
    ///
    /// A store reply of "already exists" is not an error.
    ///
    /// # Errors
    ///
    /// `UnsupportedRemoteExecution` carrying the statement when the store
    /// cannot run it and the table is missing; `Store` for anything else.
    #[instrument(skip(self, table), fields(table = table.name, backend = self.store.backend()))]
    pub async fn ensure_table(&self, table: &TableSchema) -> Result<Bootstrap, SchemaError> {
        let existed = self.table_exists(table).await?;
        let statement = table.create_statement();

        match self.store.execute(&statement).await {
            Ok(()) if existed => Ok(Bootstrap::AlreadyExisted),
            Ok(()) => {
                tracing::info!("table created");
                Ok(Bootstrap::Created)
            }
            Err(SchemaError::AlreadyExists) => Ok(Bootstrap::AlreadyExisted),
            Err(SchemaError::UnsupportedRemoteExecution { .. }) if existed => {
                Ok(Bootstrap::AlreadyExisted)
            }
            Err(e) => {
                tracing::warn!(error = %e, "table setup failed");
                Err(e)
            }
        }
    }

    /// Run [`ensure_table`](Self::ensure_table) for every known table, in order.
    ///
    /// Every table is attempted; each outcome is reported separately.
    pub async fn ensure_all(&self) -> Vec<(&'static str, Result<Bootstrap, SchemaError>)> {
        let mut outcomes = Vec::new();
        for table in all_tables() {
            outcomes.push((table.name, self.ensure_table(table).await));
        }
        outcomes
    }
}
