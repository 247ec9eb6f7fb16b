//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Store reachability check
//!
//! GET  /?phone_model=          - Homepage: cases cheapest-first
//!
//! # Cart
//! POST /cart/add               - Add a case (redirects home, or badge fragment for HTMX)
//! GET  /cart/count             - Cart badge fragment
//! ```

pub mod cart;
pub mod health;
pub mod home;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create all storefront routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/cart/add", post(cart::add))
        .route("/cart/count", get(cart::count))
        .route("/health", get(health::health))
        .route("/health/ready", get(health::ready))
}
