//! Generic record repository.
//!
//! One `Repository<E>` serves every table: the entity's static
//! [`TableSchema`] says which fields are searchable, filterable and
//! updatable, and how results are ordered. Field names are checked against
//! that descriptor before the store is called.

use std::marker::PhantomData;
use std::slice;
use std::str::FromStr;
use std::sync::Arc;

use funda_core::{ColumnType, Draft, Entity, SortField, TableSchema};
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::instrument;

use crate::error::StoreError;
use crate::store::{Assignment, Filter, Patch, Row, Select, Store, column_name};

/// Typed access to one table through an injected store.
pub struct Repository<E: Entity> {
    store: Arc<dyn Store>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Clone for Repository<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> std::fmt::Debug for Repository<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("table", &E::schema().name)
            .field("backend", &self.store.backend())
            .finish()
    }
}

/// Coerce a loosely typed value (often a query-string `String`) to the
/// column's JSON shape. Numerics stay decimal strings so no precision is
/// lost; every backend compares them as the column's type.
fn coerce(column_type: ColumnType, value: Value) -> Value {
    let Some(text) = value.as_str().map(str::trim) else {
        return value;
    };
    let typed = match column_type {
        ColumnType::Boolean => match text {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        ColumnType::Integer => text.parse::<i64>().ok().map(Value::from),
        ColumnType::Numeric => Decimal::from_str(text)
            .ok()
            .map(|d| Value::String(d.to_string())),
        _ => None,
    };
    typed.unwrap_or(value)
}

fn decode<E: Entity>(row: Row) -> Result<E, StoreError> {
    serde_json::from_value(Value::Object(row)).map_err(|e| {
        StoreError::Unknown(format!("malformed {} row: {e}", E::schema().name))
    })
}

fn decode_all<E: Entity>(rows: Vec<Row>) -> Result<Vec<E>, StoreError> {
    rows.into_iter().map(decode).collect()
}

impl<E: Entity> Repository<E> {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    /// The table descriptor.
    #[must_use]
    pub fn schema(&self) -> &'static TableSchema {
        E::schema()
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    fn field(&self, field: &str) -> Result<&'static str, StoreError> {
        column_name(self.schema(), field)
    }

    fn typed(&self, field: &'static str, value: Value) -> Value {
        match self.schema().column(field) {
            Some(column) => coerce(column.ty, value),
            None => value,
        }
    }

    /// Validate and insert a batch in one store call.
    ///
    /// # Errors
    ///
    /// `Invalid` when any draft fails validation (nothing is sent),
    /// `ConstraintViolation` when the store rejects the batch.
    #[instrument(skip(self, drafts), fields(table = E::schema().name, rows = drafts.len()))]
    pub async fn insert(&self, drafts: &[E::Draft]) -> Result<Vec<E>, StoreError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        for draft in drafts {
            draft.validate()?;
        }

        let rows = drafts
            .iter()
            .map(|draft| match serde_json::to_value(draft)? {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::Invalid(format!("draft is not an object: {other}"))),
            })
            .collect::<Result<Vec<Row>, StoreError>>()?;

        let inserted = self.store.insert(self.schema(), rows).await?;
        tracing::info!(inserted = inserted.len(), "rows inserted");
        decode_all(inserted)
    }

    /// Insert a single draft.
    ///
    /// # Errors
    ///
    /// As for [`insert`](Self::insert).
    pub async fn insert_one(&self, draft: &E::Draft) -> Result<E, StoreError> {
        self.insert(slice::from_ref(draft))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Unknown("insert returned no row".to_string()))
    }

    /// Every row in the given order.
    ///
    /// # Errors
    ///
    /// `MissingTable` before the table is bootstrapped; `UnknownField` for a
    /// bad sort column.
    #[instrument(skip(self), fields(table = E::schema().name))]
    pub async fn list_all(&self, order: SortField) -> Result<Vec<E>, StoreError> {
        self.field(order.field)?;
        let rows = self.store.select(self.schema(), &Select::all(order)).await?;
        decode_all(rows)
    }

    /// Every row, newest first.
    ///
    /// # Errors
    ///
    /// As for [`list_all`](Self::list_all).
    pub async fn list(&self) -> Result<Vec<E>, StoreError> {
        self.list_all(self.schema().default_order).await
    }

    /// Rows whose `field` equals `value`, in the table's filter order.
    ///
    /// # Errors
    ///
    /// `UnknownField` when `field` is not one of the table's filterable
    /// columns.
    #[instrument(skip(self, value), fields(table = E::schema().name))]
    pub async fn filter_by(&self, field: &str, value: impl Into<Value>) -> Result<Vec<E>, StoreError> {
        let field = self.field(field)?;
        if !self.schema().filterable.contains(&field) {
            return Err(StoreError::UnknownField(format!(
                "{}.{field} is not filterable",
                self.schema().name
            )));
        }
        let value = self.typed(field, value.into());
        let query = Select::all(self.schema().filter_order).with_filter(Filter::Eq { field, value });
        let rows = self.store.select(self.schema(), &query).await?;
        decode_all(rows)
    }

    /// Case-insensitive substring search across the searchable fields.
    ///
    /// A blank term lists everything.
    ///
    /// # Errors
    ///
    /// As for [`list_all`](Self::list_all).
    #[instrument(skip(self), fields(table = E::schema().name))]
    pub async fn search(&self, term: &str) -> Result<Vec<E>, StoreError> {
        let term = term.trim();
        if term.is_empty() {
            return self.list().await;
        }
        let schema = self.schema();
        let query = Select::all(schema.default_order).with_filter(Filter::Search {
            fields: schema.searchable,
            term: term.to_string(),
        });
        let rows = self.store.select(schema, &query).await?;
        decode_all(rows)
    }

    /// The first row whose `field` equals `value`.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing matches.
    #[instrument(skip(self, value), fields(table = E::schema().name))]
    pub async fn find_one(&self, field: &str, value: impl Into<Value>) -> Result<E, StoreError> {
        let field = self.field(field)?;
        let value = self.typed(field, value.into());
        let query = Select::all(self.schema().default_order)
            .with_filter(Filter::Eq { field, value })
            .with_limit(1);
        self.store
            .select(self.schema(), &query)
            .await?
            .into_iter()
            .next()
            .map_or(Err(StoreError::NotFound), decode)
    }

    /// Set one field on the row addressed by the table's update key.
    ///
    /// # Errors
    ///
    /// `UnknownField` when the field is not updatable, `NotFound` when no row
    /// has that key.
    pub async fn update_field(
        &self,
        key: impl Into<Value>,
        field: &str,
        value: impl Into<Value>,
    ) -> Result<E, StoreError> {
        self.update(key, Patch::new().set(field, value)).await
    }

    /// Apply several assignments to the row addressed by the update key.
    ///
    /// # Errors
    ///
    /// As for [`update_field`](Self::update_field).
    #[instrument(skip(self, key, patch), fields(table = E::schema().name, fields = patch.len()))]
    pub async fn update(&self, key: impl Into<Value>, patch: Patch) -> Result<E, StoreError> {
        let schema = self.schema();
        if patch.is_empty() {
            return Err(StoreError::Invalid("empty update".to_string()));
        }

        let mut typed = Patch::new();
        for (field, assignment) in patch.iter() {
            let field = self.field(field)?;
            if !schema.is_updatable(field) {
                return Err(StoreError::UnknownField(format!(
                    "{}.{field} is not updatable",
                    schema.name
                )));
            }
            typed = match assignment {
                Assignment::Set(v) => typed.set(field, self.typed(field, v.clone())),
                Assignment::Increment(by) => typed.increment(field, *by),
                Assignment::Now => typed.now(field),
            };
        }

        let key = self.typed(schema.update_key, key.into());
        match self.store.update(schema, &key, &typed).await? {
            Some(row) => decode(row),
            None => Err(StoreError::NotFound),
        }
    }

    /// Number of rows.
    ///
    /// # Errors
    ///
    /// As for [`list_all`](Self::list_all).
    pub async fn count(&self) -> Result<usize, StoreError> {
        let rows = self
            .store
            .select(self.schema(), &Select::all(self.schema().default_order))
            .await?;
        Ok(rows.len())
    }
}
