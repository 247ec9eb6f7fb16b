//! Health check endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode};
use funda_core::CASES_TABLE;
use funda_store::Bootstrapper;

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 when the store cannot be reached. A missing `fundas` table
/// still counts as ready.
pub async fn ready(State(state): State<AppState>) -> StatusCode {
    match Bootstrapper::new(Arc::clone(state.store()))
        .table_exists(&CASES_TABLE)
        .await
    {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::error!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
