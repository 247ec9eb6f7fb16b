//! Health check endpoints.

use axum::{Router, extract::State, http::StatusCode, routing::get};
use funda_core::CASES_TABLE;
use funda_store::Bootstrapper;
use std::sync::Arc;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
}

/// Liveness: the process is up.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness: the store can read the `fundas` table.
///
/// A missing table still counts as ready; only an unreachable store fails.
pub async fn ready(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    match Bootstrapper::new(Arc::clone(state.store()))
        .table_exists(&CASES_TABLE)
        .await
    {
        Ok(_) => Ok("ok"),
        Err(e) => {
            tracing::error!(error = %e, "readiness check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}
