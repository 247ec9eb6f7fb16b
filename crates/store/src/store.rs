//! The `Store` trait and the query shapes it accepts.
//!
//! A store is the injected handle to the hosted relational database. It
//! speaks rows as JSON objects and is driven by static [`TableSchema`]
//! descriptors, so one implementation serves every table. Backends:
//!
//! - [`PostgresStore`](crate::PostgresStore) - direct sqlx connection
//! - [`RestStore`](crate::RestStore) - hosted PostgREST-style HTTP API
//! - [`MemoryStore`](crate::MemoryStore) - in-process emulator

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use funda_core::{SortField, TableSchema};
use serde_json::{Map, Value};

use crate::error::{SchemaError, StoreError};

/// A stored row: column name → JSON value.
pub type Row = Map<String, Value>;

/// Row predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `field = value`
    Eq { field: &'static str, value: Value },
    /// Case-insensitive substring match on any of `fields`.
    Search {
        fields: &'static [&'static str],
        term: String,
    },
}

/// A read query against one table.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub filter: Option<Filter>,
    pub order: SortField,
    pub limit: Option<usize>,
}

impl Select {
    /// Every row in the given order.
    #[must_use]
    pub const fn all(order: SortField) -> Self {
        Self {
            filter: None,
            order,
            limit: None,
        }
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Right-hand side of one `SET` clause.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    Set(Value),
    /// Add to the current value, treating NULL as zero.
    Increment(i64),
    /// The store's current timestamp.
    Now,
}

/// Field assignments applied by a single update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    assignments: Vec<(String, Assignment)>,
}

impl Patch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments
            .push((field.into(), Assignment::Set(value.into())));
        self
    }

    #[must_use]
    pub fn increment(mut self, field: impl Into<String>, by: i64) -> Self {
        self.assignments.push((field.into(), Assignment::Increment(by)));
        self
    }

    #[must_use]
    pub fn now(mut self, field: impl Into<String>) -> Self {
        self.assignments.push((field.into(), Assignment::Now));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Assignment)> {
        self.assignments.iter().map(|(f, a)| (f.as_str(), a))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.assignments.len()
    }
}

/// Handle to the relational store.
///
/// Every method takes the table descriptor; field names in filters and
/// patches have already been checked against it by the repository, but
/// backends that build SQL resolve them through the descriptor again.
#[async_trait]
pub trait Store: Send + Sync + fmt::Debug {
    /// Short backend name for logs ("postgres", "rest", "memory").
    fn backend(&self) -> &'static str;

    /// Insert a batch of rows and return them as stored.
    ///
    /// # Errors
    ///
    /// `ConstraintViolation` when a row breaks a UNIQUE or NOT NULL
    /// constraint, `MissingTable` when the table does not exist.
    async fn insert(&self, table: &TableSchema, rows: Vec<Row>) -> Result<Vec<Row>, StoreError>;

    /// Read rows.
    ///
    /// # Errors
    ///
    /// `MissingTable` when the table does not exist.
    async fn select(&self, table: &TableSchema, query: &Select) -> Result<Vec<Row>, StoreError>;

    /// Apply `patch` to the row whose update key equals `key`.
    ///
    /// Returns `None` when no row matched.
    ///
    /// # Errors
    ///
    /// `ConstraintViolation` or `MissingTable` as for inserts.
    async fn update(
        &self,
        table: &TableSchema,
        key: &Value,
        patch: &Patch,
    ) -> Result<Option<Row>, StoreError>;

    /// Run a raw schema-definition statement.
    ///
    /// # Errors
    ///
    /// `UnsupportedRemoteExecution` when the backend has no generic execution
    /// capability.
    async fn execute(&self, statement: &str) -> Result<(), SchemaError>;
}

/// Wraps a store so every call fails with [`StoreError::Timeout`] after `limit`.
#[derive(Debug, Clone)]
pub struct TimeoutStore {
    inner: Arc<dyn Store>,
    limit: Duration,
}

impl TimeoutStore {
    #[must_use]
    pub fn new(inner: Arc<dyn Store>, limit: Duration) -> Self {
        Self { inner, limit }
    }

    async fn guard<T, E: From<StoreError>>(
        &self,
        call: impl Future<Output = Result<T, E>> + Send,
    ) -> Result<T, E> {
        match tokio::time::timeout(self.limit, call).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(backend = self.inner.backend(), limit = ?self.limit, "store call timed out");
                Err(StoreError::Timeout.into())
            }
        }
    }
}

#[async_trait]
impl Store for TimeoutStore {
    fn backend(&self) -> &'static str {
        self.inner.backend()
    }

    async fn insert(&self, table: &TableSchema, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        self.guard(self.inner.insert(table, rows)).await
    }

    async fn select(&self, table: &TableSchema, query: &Select) -> Result<Vec<Row>, StoreError> {
        self.guard(self.inner.select(table, query)).await
    }

    async fn update(
        &self,
        table: &TableSchema,
        key: &Value,
        patch: &Patch,
    ) -> Result<Option<Row>, StoreError> {
        self.guard(self.inner.update(table, key, patch)).await
    }

    async fn execute(&self, statement: &str) -> Result<(), SchemaError> {
        self.guard(self.inner.execute(statement)).await
    }
}

/// Resolve a field name to the descriptor's `'static` column name.
///
/// # Errors
///
/// Returns `UnknownField` when the table has no such column.
pub fn column_name(table: &TableSchema, field: &str) -> Result<&'static str, StoreError> {
    table
        .columns
        .iter()
        .find(|c| c.name == field)
        .map(|c| c.name)
        .ok_or_else(|| StoreError::UnknownField(format!("{}.{field}", table.name)))
}

/// Escape `%`, `_` and `\` for use inside a LIKE pattern.
#[must_use]
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use funda_core::CASES_TABLE;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_patch_builder() {
        let patch = Patch::new()
            .set("current_page", "/carrito")
            .increment("visit_count", 1)
            .now("last_visit");
        let fields: Vec<_> = patch.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec!["current_page", "visit_count", "last_visit"]);
        assert_eq!(patch.len(), 3);
        assert_eq!(
            patch.iter().next().unwrap().1,
            &Assignment::Set(json!("/carrito"))
        );
    }

    #[test]
    fn test_column_name() {
        assert_eq!(column_name(&CASES_TABLE, "stock").unwrap(), "stock");
        assert_eq!(
            column_name(&CASES_TABLE, "stock; DROP TABLE fundas"),
            Err(StoreError::UnknownField(
                "fundas.stock; DROP TABLE fundas".to_string()
            ))
        );
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_eco\\"), "100\\%\\_eco\\\\");
        assert_eq!(escape_like("iPhone"), "iPhone");
    }
}
