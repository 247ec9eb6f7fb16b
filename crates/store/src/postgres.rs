//! `PostgreSQL` store over a sqlx pool.
//!
//! Rows travel as `jsonb`: inserts, single-field writes and equality
//! comparisons go through `jsonb_populate_record` so the server does every
//! type conversion, and reads return `to_jsonb(row)`. Comparisons keep the
//! bare column on the left so the bootstrapped indexes apply. Column names
//! are resolved through the table descriptor before they are spliced into
//! SQL; values are always bound.

use std::fmt::Write as _;
use std::time::Duration;

use async_trait::async_trait;
use funda_core::TableSchema;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::{SchemaError, StoreError};
use crate::store::{Assignment, Filter, Patch, Row, Select, Store, column_name, escape_like};

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Store backed by a direct `PostgreSQL` connection.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

enum Bind {
    Json(Value),
    Int(i64),
    Text(String),
}

fn into_row(value: Value) -> Result<Row, StoreError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Unknown(format!("expected a row object, got {other}"))),
    }
}

fn quoted(column: &str) -> String {
    format!("\"{column}\"")
}

/// `{column: value}` for `jsonb_populate_record`.
fn single(column: &str, value: Value) -> Bind {
    let mut row = Row::new();
    row.insert(column.to_string(), value);
    Bind::Json(Value::Object(row))
}

/// The bound single-column object at `$param`, cast to the column's type.
fn typed_param(table: &TableSchema, column: &str, param: usize) -> String {
    format!(
        "(jsonb_populate_record(NULL::{}, ${param})).{}",
        table.name,
        quoted(column)
    )
}

impl PostgresStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect to `database_url`.
    ///
    /// # Errors
    ///
    /// Returns the classified connection error.
    pub async fn connect(database_url: &SecretString) -> Result<Self, StoreError> {
        Ok(Self::new(create_pool(database_url).await?))
    }

    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn insert_sql(table: &TableSchema, row: &Row) -> Result<String, StoreError> {
        if row.is_empty() {
            return Ok(format!(
                "INSERT INTO {} AS r DEFAULT VALUES RETURNING to_jsonb(r)",
                table.name
            ));
        }
        let columns = row
            .keys()
            .map(|k| column_name(table, k).map(quoted))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");
        Ok(format!(
            "INSERT INTO {t} AS r ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::{t}, $1) \
             RETURNING to_jsonb(r)",
            t = table.name
        ))
    }

    fn select_sql(table: &TableSchema, query: &Select) -> Result<(String, Vec<Bind>), StoreError> {
        let mut sql = format!("SELECT to_jsonb(r) FROM {} r", table.name);
        let mut binds = Vec::new();

        match &query.filter {
            Some(Filter::Eq { field, value }) => {
                let column = column_name(table, field)?;
                let _ = write!(
                    sql,
                    " WHERE r.{} = {}",
                    quoted(column),
                    typed_param(table, column, 1)
                );
                binds.push(single(column, value.clone()));
            }
            Some(Filter::Search { fields, term }) => {
                let clauses = fields
                    .iter()
                    .map(|f| column_name(table, f).map(|c| format!("r.{}::text ILIKE $1", quoted(c))))
                    .collect::<Result<Vec<_>, _>>()?;
                let _ = write!(sql, " WHERE ({})", clauses.join(" OR "));
                binds.push(Bind::Text(format!("%{}%", escape_like(term))));
            }
            None => {}
        }

        let order = column_name(table, query.order.field)?;
        let _ = write!(
            sql,
            " ORDER BY r.{} {}",
            quoted(order),
            query.order.direction.as_sql()
        );
        if let Some(limit) = query.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }
        Ok((sql, binds))
    }

    fn update_sql(
        table: &TableSchema,
        key: &Value,
        patch: &Patch,
    ) -> Result<(String, Vec<Bind>), StoreError> {
        let mut sets = Vec::with_capacity(patch.len());
        let mut binds = Vec::with_capacity(patch.len() + 1);

        for (field, assignment) in patch.iter() {
            let column = column_name(table, field)?;
            let target = quoted(column);
            match assignment {
                Assignment::Set(value) => {
                    binds.push(single(column, value.clone()));
                    sets.push(format!("{target} = {}", typed_param(table, column, binds.len())));
                }
                Assignment::Increment(by) => {
                    binds.push(Bind::Int(*by));
                    sets.push(format!("{target} = COALESCE({target}, 0) + ${}", binds.len()));
                }
                Assignment::Now => sets.push(format!("{target} = NOW()")),
            }
        }

        let key_column = column_name(table, table.update_key)?;
        binds.push(single(key_column, key.clone()));
        let sql = format!(
            "UPDATE {} AS r SET {} WHERE r.{} = {} RETURNING to_jsonb(r)",
            table.name,
            sets.join(", "),
            quoted(key_column),
            typed_param(table, key_column, binds.len())
        );
        Ok((sql, binds))
    }

    async fn fetch(&self, sql: &str, binds: Vec<Bind>) -> Result<Vec<Value>, sqlx::Error> {
        let mut query = sqlx::query_scalar::<_, Value>(sql);
        for bind in binds {
            query = match bind {
                Bind::Json(v) => query.bind(v),
                Bind::Int(i) => query.bind(i),
                Bind::Text(s) => query.bind(s),
            };
        }
        query.fetch_all(&self.pool).await
    }
}

#[async_trait]
impl Store for PostgresStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn insert(&self, table: &TableSchema, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = Vec::with_capacity(rows.len());

        for row in rows {
            let sql = Self::insert_sql(table, &row)?;
            let query = sqlx::query_scalar::<_, Value>(&sql);
            let query = if row.is_empty() {
                query
            } else {
                query.bind(Value::Object(row))
            };
            let stored = query.fetch_one(&mut *tx).await?;
            inserted.push(into_row(stored)?);
        }

        tx.commit().await?;
        Ok(inserted)
    }

    async fn select(&self, table: &TableSchema, query: &Select) -> Result<Vec<Row>, StoreError> {
        let (sql, binds) = Self::select_sql(table, query)?;
        self.fetch(&sql, binds)
            .await?
            .into_iter()
            .map(into_row)
            .collect()
    }

    async fn update(
        &self,
        table: &TableSchema,
        key: &Value,
        patch: &Patch,
    ) -> Result<Option<Row>, StoreError> {
        let (sql, binds) = Self::update_sql(table, key, patch)?;
        self.fetch(&sql, binds)
            .await?
            .into_iter()
            .next()
            .map(into_row)
            .transpose()
    }

    async fn execute(&self, statement: &str) -> Result<(), SchemaError> {
        // 42P07 duplicate_table, 42710 duplicate_object
        match sqlx::raw_sql(statement).execute(&self.pool).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err))
                if matches!(db_err.code().as_deref(), Some("42P07" | "42710")) =>
            {
                Err(SchemaError::AlreadyExists)
            }
            Err(e) => Err(SchemaError::Store(e.into())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use funda_core::{CASES_TABLE, SortField, TRACKING_TABLE};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_insert_sql_lists_supplied_columns() {
        let row = json!({"name": "Funda", "phone_model": "iPhone 16"});
        let sql = PostgresStore::insert_sql(&CASES_TABLE, row.as_object().unwrap()).unwrap();
        assert_eq!(
            sql,
            "INSERT INTO fundas AS r (\"name\", \"phone_model\") \
             SELECT \"name\", \"phone_model\" FROM jsonb_populate_record(NULL::fundas, $1) \
             RETURNING to_jsonb(r)"
        );
    }

    #[test]
    fn test_insert_sql_rejects_unknown_columns() {
        let row = json!({"name\"; DROP TABLE fundas; --": 1});
        assert!(matches!(
            PostgresStore::insert_sql(&CASES_TABLE, row.as_object().unwrap()),
            Err(StoreError::UnknownField(_))
        ));
    }

    #[test]
    fn test_select_sql_search() {
        let query = Select::all(SortField::NEWEST_FIRST).with_filter(Filter::Search {
            fields: CASES_TABLE.searchable,
            term: "50%".to_string(),
        });
        let (sql, binds) = PostgresStore::select_sql(&CASES_TABLE, &query).unwrap();
        assert!(sql.contains("r.\"name\"::text ILIKE $1 OR r.\"phone_model\"::text ILIKE $1"));
        assert!(sql.ends_with("ORDER BY r.\"created_at\" DESC"));
        assert!(matches!(&binds[..], [Bind::Text(t)] if t == "%50\\%%"));
    }

    #[test]
    fn test_select_sql_filter_and_limit() {
        let query = Select::all(SortField::asc("price"))
            .with_filter(Filter::Eq {
                field: "material",
                value: json!("TPU"),
            })
            .with_limit(1);
        let (sql, _) = PostgresStore::select_sql(&CASES_TABLE, &query).unwrap();
        assert_eq!(
            sql,
            "SELECT to_jsonb(r) FROM fundas r \
             WHERE r.\"material\" = (jsonb_populate_record(NULL::fundas, $1)).\"material\" \
             ORDER BY r.\"price\" ASC LIMIT 1"
        );
    }

    #[test]
    fn test_select_sql_numeric_filter_binds_typed_object() {
        let query = Select::all(SortField::asc("price")).with_filter(Filter::Eq {
            field: "price",
            value: json!("299.00"),
        });
        let (sql, binds) = PostgresStore::select_sql(&CASES_TABLE, &query).unwrap();
        assert!(sql.contains(
            "WHERE r.\"price\" = (jsonb_populate_record(NULL::fundas, $1)).\"price\""
        ));
        assert!(matches!(&binds[..], [Bind::Json(v)] if *v == json!({"price": "299.00"})));
    }

    #[test]
    fn test_update_sql() {
        let patch = Patch::new()
            .set("current_page", "/carrito")
            .increment("visit_count", 1)
            .now("last_visit");
        let (sql, binds) = PostgresStore::update_sql(&TRACKING_TABLE, &json!("s1"), &patch).unwrap();
        assert_eq!(
            sql,
            "UPDATE users_tracking AS r SET \
             \"current_page\" = (jsonb_populate_record(NULL::users_tracking, $1)).\"current_page\", \
             \"visit_count\" = COALESCE(\"visit_count\", 0) + $2, \
             \"last_visit\" = NOW() \
             WHERE r.\"session_id\" = (jsonb_populate_record(NULL::users_tracking, $3)).\"session_id\" \
             RETURNING to_jsonb(r)"
        );
        assert_eq!(binds.len(), 3);
        assert!(matches!(&binds[2], Bind::Json(v) if *v == json!({"session_id": "s1"})));
    }
}
