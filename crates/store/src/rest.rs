//! Hosted store reached over its PostgREST-style HTTP API.
//!
//! # API Reference
//!
//! - Tables: `{base}/rest/v1/{table}` with `column=eq.value`,
//!   `or=(col.ilike.*term*,...)`, `order=col.asc`, `limit=n`
//! - Writes send `Prefer: return=representation` to get rows back
//! - Raw statements: `POST {base}/rest/v1/rpc/exec_sql` with `{"sql": ...}`,
//!   which only exists if the project installed that function
//! - Authentication: `apikey` and `Authorization: Bearer` headers

use std::sync::Arc;

use async_trait::async_trait;
use funda_core::TableSchema;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{SchemaError, StoreError};
use crate::store::{Assignment, Filter, Patch, Row, Select, Store, column_name, escape_like};

/// Error body returned by the REST layer.
#[derive(Debug, Default, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Error code for "function not found in schema cache".
const MISSING_FUNCTION: &str = "PGRST202";

/// Store backed by a hosted REST API.
#[derive(Clone)]
pub struct RestStore {
    inner: Arc<RestStoreInner>,
}

struct RestStoreInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for RestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestStore")
            .field("base_url", &self.inner.base_url.as_str())
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

/// Render a scalar for a `column=eq.value` filter.
fn filter_value(value: &Value) -> String {
    match value {
        Value::Null => "is.null".to_string(),
        Value::String(s) => format!("eq.{s}"),
        other => format!("eq.{other}"),
    }
}

/// Quote a value inside an `or=(...)` list.
fn quote_term(term: &str) -> String {
    term.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Literal LIKE pattern for `term`, matching the Postgres backend.
///
/// The service turns every `*` into `%` and has no escape for it, so a
/// literal `*` becomes the single-character wildcard `_`.
fn like_term(term: &str) -> String {
    escape_like(term).replace('*', "_")
}

fn search_clause(table: &TableSchema, fields: &[&str], term: &str) -> Result<String, StoreError> {
    let term = quote_term(&like_term(term));
    let clauses = fields
        .iter()
        .map(|f| column_name(table, f).map(|c| format!("{c}.ilike.\"*{term}*\"")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!("({})", clauses.join(",")))
}

fn into_rows(value: Value) -> Result<Vec<Row>, StoreError> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(row) => Ok(row),
                other => Err(StoreError::Unknown(format!("expected a row object, got {other}"))),
            })
            .collect(),
        other => Err(StoreError::Unknown(format!("expected an array of rows, got {other}"))),
    }
}

impl RestStore {
    /// Create a client for the API at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(base_url: Url, api_key: &SecretString) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();

        let key = HeaderValue::from_str(api_key.expose_secret())
            .map_err(|e| StoreError::Unknown(format!("invalid API key format: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|e| StoreError::Unknown(format!("invalid API key format: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            inner: Arc::new(RestStoreInner { client, base_url }),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, StoreError> {
        self.inner
            .base_url
            .join(&format!("rest/v1/{path}"))
            .map_err(|e| StoreError::Unknown(format!("invalid store URL: {e}")))
    }

    fn select_params(
        table: &TableSchema,
        query: &Select,
    ) -> Result<Vec<(String, String)>, StoreError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        match &query.filter {
            Some(Filter::Eq { field, value }) => {
                let column = column_name(table, field)?;
                params.push((column.to_string(), filter_value(value)));
            }
            Some(Filter::Search { fields, term }) => {
                params.push(("or".to_string(), search_clause(table, fields, term)?));
            }
            None => {}
        }
        let order = column_name(table, query.order.field)?;
        let direction = if query.order.direction.is_ascending() {
            "asc"
        } else {
            "desc"
        };
        params.push(("order".to_string(), format!("{order}.{direction}")));
        if let Some(limit) = query.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        Ok(params)
    }

    /// Handle API response and parse the row array.
    async fn handle_response(&self, response: reqwest::Response) -> Result<Vec<Row>, StoreError> {
        let status = response.status();
        if status.is_success() {
            let body: Value = response
                .json()
                .await
                .map_err(|e| StoreError::Unknown(format!("failed to parse response: {e}")))?;
            return into_rows(body);
        }
        let (code, message) = Self::parse_error(response).await;
        Err(StoreError::from_sqlstate(&code, message))
    }

    /// Parse an error response into its code and message.
    async fn parse_error(response: reqwest::Response) -> (String, String) {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();
        let error: ApiError = serde_json::from_str(&text).unwrap_or_default();
        let message = match (error.message, error.details) {
            (Some(message), Some(details)) => format!("{message} ({details})"),
            (Some(message), None) => message,
            (None, _) if text.is_empty() => format!("HTTP {status}"),
            (None, _) => text,
        };
        (error.code.unwrap_or_default(), message)
    }

    async fn current_row(&self, table: &TableSchema, key: &Value) -> Result<Option<Row>, StoreError> {
        let query = Select::all(table.default_order)
            .with_filter(Filter::Eq {
                field: table.update_key,
                value: key.clone(),
            })
            .with_limit(1);
        Ok(self.select(table, &query).await?.into_iter().next())
    }
}

#[async_trait]
impl Store for RestStore {
    fn backend(&self) -> &'static str {
        "rest"
    }

    async fn insert(&self, table: &TableSchema, rows: Vec<Row>) -> Result<Vec<Row>, StoreError> {
        let body = Value::Array(rows.into_iter().map(Value::Object).collect());
        let response = self
            .inner
            .client
            .post(self.endpoint(table.name)?)
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn select(&self, table: &TableSchema, query: &Select) -> Result<Vec<Row>, StoreError> {
        let params = Self::select_params(table, query)?;
        let response = self
            .inner
            .client
            .get(self.endpoint(table.name)?)
            .query(&params)
            .send()
            .await?;
        self.handle_response(response).await
    }

    async fn update(
        &self,
        table: &TableSchema,
        key: &Value,
        patch: &Patch,
    ) -> Result<Option<Row>, StoreError> {
        let needs_current = patch
            .iter()
            .any(|(_, a)| matches!(a, Assignment::Increment(_)));
        // The REST layer has no column arithmetic, so increments read first.
        let current = if needs_current {
            match self.current_row(table, key).await? {
                Some(row) => Some(row),
                None => return Ok(None),
            }
        } else {
            None
        };

        let mut body = Row::new();
        for (field, assignment) in patch.iter() {
            let column = column_name(table, field)?;
            let value = match assignment {
                Assignment::Set(v) => v.clone(),
                Assignment::Increment(by) => {
                    let base = current
                        .as_ref()
                        .and_then(|row| row.get(column))
                        .and_then(Value::as_i64)
                        .unwrap_or(0);
                    Value::from(base + by)
                }
                Assignment::Now => Value::String(chrono::Utc::now().to_rfc3339()),
            };
            body.insert(column.to_string(), value);
        }

        let key_column = column_name(table, table.update_key)?;
        let response = self
            .inner
            .client
            .patch(self.endpoint(table.name)?)
            .query(&[(key_column, filter_value(key))])
            .header("Prefer", "return=representation")
            .json(&body)
            .send()
            .await?;
        Ok(self.handle_response(response).await?.into_iter().next())
    }

    async fn execute(&self, statement: &str) -> Result<(), SchemaError> {
        let response = self
            .inner
            .client
            .post(self.endpoint("rpc/exec_sql")?)
            .json(&serde_json::json!({ "sql": statement }))
            .send()
            .await
            .map_err(StoreError::from)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let (code, message) = Self::parse_error(response).await;
        match code.as_str() {
            // 42883 undefined_function
            MISSING_FUNCTION | "42883" => Err(SchemaError::UnsupportedRemoteExecution {
                statement: statement.to_string(),
            }),
            _ if status == reqwest::StatusCode::NOT_FOUND => {
                Err(SchemaError::UnsupportedRemoteExecution {
                    statement: statement.to_string(),
                })
            }
            "42P07" | "42710" => Err(SchemaError::AlreadyExists),
            _ => Err(StoreError::from_sqlstate(&code, message).into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use funda_core::{CASES_TABLE, MAILS_TABLE, SortField};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_filter_value() {
        assert_eq!(filter_value(&json!("TPU")), "eq.TPU");
        assert_eq!(filter_value(&json!(true)), "eq.true");
        assert_eq!(filter_value(&json!(42)), "eq.42");
        assert_eq!(filter_value(&Value::Null), "is.null");
    }

    #[test]
    fn test_search_params() {
        let query = Select::all(SortField::NEWEST_FIRST).with_filter(Filter::Search {
            fields: MAILS_TABLE.searchable,
            term: "garcía".to_string(),
        });
        let params = RestStore::select_params(&MAILS_TABLE, &query).unwrap();
        assert_eq!(
            params,
            vec![
                ("select".to_string(), "*".to_string()),
                (
                    "or".to_string(),
                    "(email.ilike.\"*garcía*\",first_name.ilike.\"*garcía*\",last_name.ilike.\"*garcía*\")"
                        .to_string()
                ),
                ("order".to_string(), "created_at.desc".to_string()),
            ]
        );
    }

    #[test]
    fn test_filter_params() {
        let query = Select::all(SortField::asc("price"))
            .with_filter(Filter::Eq {
                field: "phone_model",
                value: json!("iPhone 16"),
            })
            .with_limit(1);
        let params = RestStore::select_params(&CASES_TABLE, &query).unwrap();
        assert!(params.contains(&("phone_model".to_string(), "eq.iPhone 16".to_string())));
        assert!(params.contains(&("order".to_string(), "price.asc".to_string())));
        assert!(params.contains(&("limit".to_string(), "1".to_string())));
    }

    #[test]
    fn test_quote_term() {
        assert_eq!(quote_term(r#"a"b\c"#), r#"a\"b\\c"#);
    }

    #[test]
    fn test_search_term_wildcards_are_literal() {
        assert_eq!(like_term("50%_off*"), r"50\%\_off_");
        let clause = search_clause(&CASES_TABLE, &["name"], "50%").unwrap();
        assert_eq!(clause, r#"(name.ilike."*50\\%*")"#);
    }

    #[test]
    fn test_endpoint_and_debug_redacts_key() {
        let store = RestStore::new(
            Url::parse("https://project.example.co/").unwrap(),
            &SecretString::from("service-key-abc123".to_string()),
        )
        .unwrap();
        assert_eq!(
            store.endpoint("fundas").unwrap().as_str(),
            "https://project.example.co/rest/v1/fundas"
        );
        let debug = format!("{store:?}");
        assert!(!debug.contains("service-key-abc123"));
    }

    #[test]
    fn test_into_rows() {
        let rows = into_rows(json!([{"id": 1}, {"id": 2}])).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(into_rows(json!({"id": 1})).is_err());
    }
}
