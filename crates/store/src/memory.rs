//! In-process store.
//!
//! Emulates the parts of the relational store the repository relies on:
//! column defaults, NOT NULL and UNIQUE constraints, the `updated_at`
//! trigger, missing tables, and (optionally) raw statement execution.
//! Each insert batch is all-or-nothing.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use funda_core::schema::all_tables;
use funda_core::{Column, ColumnDefault, ColumnType, TableSchema};
use rust_decimal::Decimal;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{SchemaError, StoreError};
use crate::store::{Assignment, Filter, Patch, Row, Select, Store};

/// In-memory store backend.
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Vec<Row>>>,
    remote_execution: bool,
    latency: Option<Duration>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// An empty store with no tables that accepts schema statements.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            remote_execution: true,
            latency: None,
        }
    }

    /// A store where every known table already exists (empty).
    #[must_use]
    pub fn with_all_tables() -> Self {
        let tables = all_tables().into_iter().map(|t| (t.name, Vec::new())).collect();
        Self {
            tables: RwLock::new(tables),
            ..Self::new()
        }
    }

    /// Reject raw statements the way a hosted API without `exec_sql` does.
    #[must_use]
    pub const fn without_remote_execution(mut self) -> Self {
        self.remote_execution = false;
        self
    }

    /// Delay every call by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Create an empty table for `table` if it does not exist.
    pub async fn create_table(&self, table: &TableSchema) {
        self.tables.write().await.entry(table.name).or_default();
    }

    /// Whether the table exists.
    pub async fn has_table(&self, name: &str) -> bool {
        self.tables.read().await.contains_key(name)
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// A timestamp strictly after `previous`, for the `updated_at` trigger.
fn touched(previous: Option<&Value>) -> String {
    let now = Utc::now();
    let prev = previous
        .and_then(Value::as_str)
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc));
    let stamp = match prev {
        Some(prev) if prev >= now => prev + chrono::Duration::nanoseconds(1),
        _ => now,
    };
    stamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Column default; `NOW()` is the statement timestamp, shared by all columns.
fn default_value(default: ColumnDefault, statement_time: &str) -> Value {
    match default {
        ColumnDefault::GeneratedUuid => Value::String(uuid::Uuid::new_v4().to_string()),
        ColumnDefault::Now => Value::String(statement_time.to_string()),
        ColumnDefault::Bool(b) => Value::Bool(b),
        ColumnDefault::Int(n) => Value::from(n),
        ColumnDefault::Text(s) => Value::String(s.to_string()),
    }
}

fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string()).ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

/// Coerce a written value to the column's stored representation.
fn normalize(table: &TableSchema, column: &Column, value: Value) -> Result<Value, StoreError> {
    if value.is_null() {
        return Ok(value);
    }
    let invalid = |v: &Value| {
        StoreError::Unknown(format!(
            "invalid input for {} column {}.{}: {v}",
            column.ty.sql(),
            table.name,
            column.name
        ))
    };
    match column.ty {
        // Kept as decimal text so amounts round-trip exactly.
        ColumnType::Numeric => decimal(&value)
            .map(|d| Value::String(d.to_string()))
            .ok_or_else(|| invalid(&value)),
        ColumnType::Integer => {
            if value.is_i64() {
                return Ok(value);
            }
            value
                .as_str()
                .and_then(|s| s.trim().parse::<i64>().ok())
                .map(Value::from)
                .ok_or_else(|| invalid(&value))
        }
        ColumnType::Boolean => {
            if value.is_boolean() {
                return Ok(value);
            }
            match value.as_str() {
                Some("true") => Ok(Value::Bool(true)),
                Some("false") => Ok(Value::Bool(false)),
                _ => Err(invalid(&value)),
            }
        }
        ColumnType::TextArray => {
            if value.as_array().is_some_and(|items| items.iter().all(Value::is_string)) {
                Ok(value)
            } else {
                Err(invalid(&value))
            }
        }
        ColumnType::Uuid | ColumnType::Text | ColumnType::Date | ColumnType::Timestamp => {
            if value.is_string() {
                Ok(value)
            } else {
                Ok(Value::String(value.to_string()))
            }
        }
    }
}

fn values_equal(column: Option<&Column>, a: &Value, b: &Value) -> bool {
    if column.is_some_and(|c| c.ty.is_numeric())
        && let (Some(x), Some(y)) = (decimal(a), decimal(b))
    {
        return x == y;
    }
    match (a, b) {
        // Filters arrive from query strings, so "true" matches a boolean column.
        (Value::Bool(x), Value::String(y)) | (Value::String(y), Value::Bool(x)) => {
            y == if *x { "true" } else { "false" }
        }
        _ => a == b,
    }
}

/// Order two column values; NULL sorts after everything.
fn compare(column: Option<&Column>, a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }
    if column.is_some_and(|c| c.ty.is_numeric())
        && let (Some(x), Some(y)) = (decimal(a), decimal(b))
    {
        return x.cmp(&y);
    }
    if column.is_some_and(|c| c.ty == ColumnType::Timestamp)
        && let (Some(x), Some(y)) = (a.as_str(), b.as_str())
        && let (Ok(x), Ok(y)) = (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y))
    {
        return x.cmp(&y);
    }
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn matches(table: &TableSchema, row: &Row, filter: &Filter) -> bool {
    match filter {
        Filter::Eq { field, value } => row
            .get(*field)
            .is_some_and(|v| values_equal(table.column(field), v, value)),
        Filter::Search { fields, term } => {
            let needle = term.to_lowercase();
            fields.iter().any(|f| {
                row.get(*f)
                    .and_then(Value::as_str)
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
            })
        }
    }
}

fn not_null_violation(table: &TableSchema, column: &str) -> StoreError {
    StoreError::ConstraintViolation(format!(
        "null value in column \"{column}\" of relation \"{}\" violates not-null constraint",
        table.name
    ))
}

fn unique_violation(table: &TableSchema, column: &str) -> StoreError {
    StoreError::ConstraintViolation(format!(
        "duplicate key value violates unique constraint \"{}_{column}_key\"",
        table.name
    ))
}

/// Check every UNIQUE column of `candidate` against `existing` rows.
fn check_unique<'a>(
    table: &TableSchema,
    candidate: &Row,
    existing: impl Iterator<Item = &'a Row> + Clone,
) -> Result<(), StoreError> {
    for column in table.unique_columns() {
        let Some(value) = candidate.get(column.name).filter(|v| !v.is_null()) else {
            continue;
        };
        let clash = existing
            .clone()
            .any(|row| row.get(column.name).is_some_and(|v| values_equal(Some(column), v, value)));
        if clash {
            return Err(unique_violation(table, column.name));
        }
    }
    Ok(())
}

fn build_row(table: &TableSchema, input: Row, statement_time: &str) -> Result<Row, StoreError> {
    if let Some(unknown) = input.keys().find(|k| table.column(k).is_none()) {
        return Err(StoreError::UnknownField(format!("{}.{unknown}", table.name)));
    }
    let mut input = input;
    let mut row = Row::new();
    for column in table.columns {
        let value = match input.remove(column.name) {
            Some(v) => normalize(table, column, v)?,
            None => match column.default {
                Some(default) => normalize(table, column, default_value(default, statement_time))?,
                None => Value::Null,
            },
        };
        if column.not_null && value.is_null() {
            return Err(not_null_violation(table, column.name));
        }
        row.insert(column.name.to_string(), value);
    }
    Ok(row)
}

/// Table names created by `CREATE TABLE` clauses in `statement`.
fn created_tables(statement: &str) -> Vec<(String, bool)> {
    let mut created = Vec::new();
    for line in statement.lines() {
        let words: Vec<&str> = line.split_whitespace().collect();
        let [first, second, rest @ ..] = words.as_slice() else {
            continue;
        };
        if !first.eq_ignore_ascii_case("CREATE") || !second.eq_ignore_ascii_case("TABLE") {
            continue;
        }
        let (if_not_exists, rest) = match rest {
            [a, b, c, rest @ ..]
                if a.eq_ignore_ascii_case("IF")
                    && b.eq_ignore_ascii_case("NOT")
                    && c.eq_ignore_ascii_case("EXISTS") =>
            {
                (true, rest)
            }
            _ => (false, rest),
        };
        if let Some(name) = rest.first() {
            let name = name.split('(').next().unwrap_or_default();
            if !name.is_empty() {
                created.push((name.to_string(), if_not_exists));
            }
        }
    }
    created
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, table: &TableSchema, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        let existing = tables
            .get_mut(table.name)
            .ok_or_else(|| StoreError::MissingTable(table.name.to_string()))?;

        let statement_time = now();
        let mut batch: Vec<Row> = Vec::with_capacity(rows.len());
        for input in rows {
            let row = build_row(table, input, &statement_time)?;
            check_unique(table, &row, existing.iter().chain(batch.iter()))?;
            batch.push(row);
        }

        existing.extend(batch.iter().cloned());
        Ok(batch)
    }

    async fn select(&self, table: &TableSchema, query: &Select) -> Result<Vec<Row>, StoreError> {
        self.delay().await;
        let tables = self.tables.read().await;
        let rows = tables
            .get(table.name)
            .ok_or_else(|| StoreError::MissingTable(table.name.to_string()))?;

        let mut selected: Vec<Row> = rows
            .iter()
            .filter(|row| query.filter.as_ref().is_none_or(|f| matches(table, row, f)))
            .cloned()
            .collect();

        let order = query.order;
        let column = table.column(order.field);
        selected.sort_by(|a, b| {
            let ordering = compare(
                column,
                a.get(order.field).unwrap_or(&Value::Null),
                b.get(order.field).unwrap_or(&Value::Null),
            );
            if order.direction.is_ascending() {
                ordering
            } else {
                ordering.reverse()
            }
        });

        if let Some(limit) = query.limit {
            selected.truncate(limit);
        }
        Ok(selected)
    }

    async fn update(
        &self,
        table: &TableSchema,
        key: &Value,
        patch: &Patch,
    ) -> Result<Option<Row>, StoreError> {
        self.delay().await;
        let mut tables = self.tables.write().await;
        let rows = tables
            .get_mut(table.name)
            .ok_or_else(|| StoreError::MissingTable(table.name.to_string()))?;

        let key_column = table.column(table.update_key);
        let Some(position) = rows.iter().position(|row| {
            row.get(table.update_key)
                .is_some_and(|v| values_equal(key_column, v, key))
        }) else {
            return Ok(None);
        };

        let Some(current) = rows.get(position) else {
            return Ok(None);
        };
        let mut updated = current.clone();
        for (field, assignment) in patch.iter() {
            let column = table
                .column(field)
                .ok_or_else(|| StoreError::UnknownField(format!("{}.{field}", table.name)))?;
            let value = match assignment {
                Assignment::Set(v) => normalize(table, column, v.clone())?,
                Assignment::Increment(by) => {
                    let current = updated.get(field).and_then(Value::as_i64).unwrap_or(0);
                    Value::from(current.saturating_add(*by))
                }
                Assignment::Now => Value::String(now()),
            };
            if column.not_null && value.is_null() {
                return Err(not_null_violation(table, field));
            }
            updated.insert(field.to_string(), value);
        }

        if table.has_touch_trigger() {
            let stamp = touched(current.get("updated_at"));
            updated.insert("updated_at".to_string(), Value::String(stamp));
        }

        let others = rows
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != position)
            .map(|(_, row)| row);
        check_unique(table, &updated, others)?;

        if let Some(slot) = rows.get_mut(position) {
            *slot = updated.clone();
        }
        Ok(Some(updated))
    }

    async fn execute(&self, statement: &str) -> Result<(), SchemaError> {
        self.delay().await;
        if !self.remote_execution {
            return Err(SchemaError::UnsupportedRemoteExecution {
                statement: statement.to_string(),
            });
        }

        let mut tables = self.tables.write().await;
        for (name, if_not_exists) in created_tables(statement) {
            if tables.contains_key(name.as_str()) {
                if if_not_exists {
                    continue;
                }
                return Err(SchemaError::AlreadyExists);
            }
            let schema = all_tables()
                .into_iter()
                .find(|t| t.name == name)
                .ok_or_else(|| {
                    StoreError::Unknown(format!("no descriptor for table '{name}'"))
                })?;
            tables.insert(schema.name, Vec::new());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use funda_core::{CASES_TABLE, MAILS_TABLE, SortField, TRACKING_TABLE};
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> Row {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_missing_table() {
        let store = MemoryStore::new();
        let err = store
            .select(&CASES_TABLE, &Select::all(SortField::NEWEST_FIRST))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::MissingTable("fundas".to_string()));
    }

    #[tokio::test]
    async fn test_insert_applies_defaults() {
        let store = MemoryStore::with_all_tables();
        let inserted = store
            .insert(&CASES_TABLE, vec![row(json!({"name": "Funda", "phone_model": "iPhone 16"}))])
            .await
            .unwrap();
        let stored = &inserted[0];
        assert_eq!(stored["price"], json!("0"));
        assert_eq!(stored["stock"], json!(0));
        assert!(stored["id"].is_string());
        assert!(stored["material"].is_null());
        assert_eq!(stored["created_at"], stored["updated_at"]);
    }

    #[tokio::test]
    async fn test_not_null_and_unique() {
        let store = MemoryStore::with_all_tables();
        let err = store
            .insert(&CASES_TABLE, vec![row(json!({"name": "Funda"}))])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));

        store
            .insert(&MAILS_TABLE, vec![row(json!({"email": "a@b.mx"}))])
            .await
            .unwrap();
        let err = store
            .insert(&MAILS_TABLE, vec![row(json!({"email": "a@b.mx"}))])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
    }

    #[tokio::test]
    async fn test_batch_is_all_or_nothing() {
        let store = MemoryStore::with_all_tables();
        let err = store
            .insert(
                &MAILS_TABLE,
                vec![row(json!({"email": "x@y.mx"})), row(json!({"email": "x@y.mx"}))],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ConstraintViolation(_)));
        let rows = store
            .select(&MAILS_TABLE, &Select::all(SortField::NEWEST_FIRST))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_numeric_order_and_filter() {
        let store = MemoryStore::with_all_tables();
        let rows = [("A", "899.00"), ("B", "149.00"), ("C", "1000")]
            .into_iter()
            .map(|(name, price)| row(json!({"name": name, "phone_model": "iPhone 16", "price": price})))
            .collect();
        store.insert(&CASES_TABLE, rows).await.unwrap();

        let query = Select::all(SortField::asc("price")).with_filter(Filter::Eq {
            field: "phone_model",
            value: json!("iPhone 16"),
        });
        let names: Vec<_> = store
            .select(&CASES_TABLE, &query)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r["name"].clone())
            .collect();
        assert_eq!(names, vec![json!("B"), json!("A"), json!("C")]);
    }

    #[tokio::test]
    async fn test_update_increment_and_trigger() {
        let store = MemoryStore::with_all_tables();
        let inserted = store
            .insert(&TRACKING_TABLE, vec![row(json!({"session_id": "s1"}))])
            .await
            .unwrap();
        let before = inserted[0].clone();

        let patch = Patch::new()
            .set("current_page", "/carrito")
            .increment("visit_count", 1)
            .now("last_visit");
        let after = store
            .update(&TRACKING_TABLE, &json!("s1"), &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after["visit_count"], json!(2));
        assert_eq!(after["current_page"], json!("/carrito"));
        assert_ne!(after["updated_at"], before["updated_at"]);
        assert_eq!(after["created_at"], before["created_at"]);

        let missing = store
            .update(&TRACKING_TABLE, &json!("nope"), &patch)
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_increment_saturates() {
        let store = MemoryStore::with_all_tables();
        store
            .insert(
                &TRACKING_TABLE,
                vec![row(json!({"session_id": "s1", "visit_count": i64::MAX - 1}))],
            )
            .await
            .unwrap();

        let patch = Patch::new().increment("visit_count", 5);
        let after = store
            .update(&TRACKING_TABLE, &json!("s1"), &patch)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(after["visit_count"], json!(i64::MAX));
    }

    #[tokio::test]
    async fn test_execute_creates_tables() {
        let store = MemoryStore::new();
        store.execute(&CASES_TABLE.create_statement()).await.unwrap();
        assert!(store.has_table("fundas").await);
        // Idempotent.
        store.execute(&CASES_TABLE.create_statement()).await.unwrap();
        assert_eq!(
            store.execute("CREATE TABLE fundas (id UUID)").await,
            Err(SchemaError::AlreadyExists)
        );
    }

    #[tokio::test]
    async fn test_execute_unsupported() {
        let store = MemoryStore::new().without_remote_execution();
        let err = store.execute("SELECT 1").await.unwrap_err();
        assert_eq!(err.manual_statement(), Some("SELECT 1"));
    }

    #[test]
    fn test_created_tables() {
        let created = created_tables("-- x\nCREATE TABLE IF NOT EXISTS mails (\n  id UUID\n);\ncreate table foo(id int);");
        assert_eq!(
            created,
            vec![("mails".to_string(), true), ("foo".to_string(), false)]
        );
    }
}
