//! Funda Admin library.
//!
//! Internal screens over the four storefront tables: list, search, filter
//! and summarize rows, create missing tables, and insert dummy data.
//! Exposed as a library so the router can be exercised in tests.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod routes;
pub mod screen;
pub mod state;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the admin router with request tracing.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use funda_store::MemoryStore;
    use tower::ServiceExt;

    use super::*;

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn post(uri: &str, form: &str) -> Request<Body> {
        Request::post(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_missing_table_shows_setup() {
        let app = app(AppState::new(Arc::new(MemoryStore::new())));
        let response = app.oneshot(get("/cases")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("CREATE TABLE IF NOT EXISTS fundas"));
    }

    #[tokio::test]
    async fn test_setup_seed_and_search() {
        let app = app(AppState::new(Arc::new(MemoryStore::new())));

        let html = body_text(app.clone().oneshot(post("/cases/setup", "")).await.unwrap()).await;
        assert!(html.contains("Table fundas created"));

        let html = body_text(app.clone().oneshot(post("/cases/seed", "")).await.unwrap()).await;
        assert!(html.contains("Inserted 10 rows into fundas"));

        let response = app.oneshot(get("/cases/rows?q=razer")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Funda Gaming RGB"));
        assert!(!html.contains("Funda Minimalista"));
        assert!(!html.contains("<html"));
    }

    #[tokio::test]
    async fn test_mail_subscription_toggle() {
        let state = AppState::new(Arc::new(MemoryStore::with_all_tables()));
        state.mails().seed().await.unwrap();
        let email = state.mails().repo().list().await.unwrap()[0].email.clone();

        let form = format!("email={}&subscribed=false", email.replace('@', "%40"));
        let html = body_text(
            app(state.clone())
                .oneshot(post("/mails/subscription", &form))
                .await
                .unwrap(),
        )
        .await;
        assert!(html.contains(&format!("{email} unsubscribed")));

        let entry = state.mails().repo().find_one("email", email.as_str()).await.unwrap();
        assert!(!entry.subscribed);
    }

    #[tokio::test]
    async fn test_negative_stock_is_reported() {
        let state = AppState::new(Arc::new(MemoryStore::with_all_tables()));
        state.cases().seed().await.unwrap();
        let id = state.cases().repo().list().await.unwrap()[0].id;

        let response = app(state)
            .oneshot(post(&format!("/cases/{id}/stock"), "stock=-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("Could not update stock"));
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let state = AppState::new(Arc::new(MemoryStore::new()));
        state.users().setup().await.unwrap();
        state.users().seed().await.unwrap();

        let html = body_text(app(state).oneshot(get("/")).await.unwrap()).await;
        assert!(html.contains("<strong class=\"count\">12</strong>"));
        assert!(html.contains("<strong class=\"count\">-</strong>"));
    }

    fn rows_from(uri: &str, client: &str) -> Request<Body> {
        Request::get(uri)
            .header(screen::CLIENT_HEADER, client)
            .body(Body::empty())
            .unwrap()
    }

    fn slow_seeded_state() -> AppState {
        let store = MemoryStore::with_all_tables().with_latency(Duration::from_millis(50));
        AppState::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_concurrent_page_loads_all_render() {
        let state = slow_seeded_state();
        state.cases().seed().await.unwrap();

        let first = tokio::spawn(app(state.clone()).oneshot(get("/cases?q=iphone")));
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = app(state).oneshot(get("/cases?q=galaxy")).await.unwrap();

        assert_eq!(first.await.unwrap().unwrap().status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_live_search_sequenced_per_page() {
        let state = slow_seeded_state();
        state.cases().seed().await.unwrap();

        let stale = tokio::spawn(app(state.clone()).oneshot(rows_from("/cases/rows?q=iphone", "page-a")));
        let other_page = tokio::spawn(app(state.clone()).oneshot(rows_from("/cases/rows?q=funda", "page-b")));
        tokio::time::sleep(Duration::from_millis(10)).await;
        let latest = app(state).oneshot(rows_from("/cases/rows?q=razer", "page-a")).await.unwrap();

        assert_eq!(stale.await.unwrap().unwrap().status(), StatusCode::NO_CONTENT);
        assert_eq!(other_page.await.unwrap().unwrap().status(), StatusCode::OK);
        assert_eq!(latest.status(), StatusCode::OK);
        assert!(body_text(latest).await.contains("Funda Gaming RGB"));
    }

    #[tokio::test]
    async fn test_page_carries_client_header() {
        let app = app(AppState::new(Arc::new(MemoryStore::with_all_tables())));
        let html = body_text(app.oneshot(get("/mails")).await.unwrap()).await;
        assert!(html.contains("hx-headers='{\"X-Funda-Client\": \""));
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = app(AppState::new(Arc::new(MemoryStore::new())));
        let response = app.clone().oneshot(get("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app.oneshot(get("/health/ready")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(middleware::REQUEST_ID_HEADER));
    }
}
