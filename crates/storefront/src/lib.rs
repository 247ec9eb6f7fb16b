//! Funda Storefront library.
//!
//! The public marketing homepage: cases cheapest-first with a phone-model
//! filter, a session cart badge, and one visitor-tracking row per session.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// Build the storefront router.
///
/// `secure_cookies` marks the session cookie `Secure`; set it when serving
/// over https. Sentry layers are added by the binary.
pub fn app(state: AppState, secure_cookies: bool) -> Router {
    routes::routes()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::visit_tracking_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::security_headers_middleware))
        .layer(middleware::create_session_layer(secure_cookies))
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
    use funda_core::{CaseRecord, Seeded, TrackingSession};
    use funda_store::{MemoryStore, Repository, Store};
    use tower::ServiceExt;

    use super::*;

    async fn seeded_store() -> Arc<dyn Store> {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::with_all_tables());
        Repository::<CaseRecord>::new(Arc::clone(&store))
            .insert(&CaseRecord::seed())
            .await
            .unwrap();
        store
    }

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn session_cookie(response: &axum::response::Response) -> String {
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .unwrap()
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_home_lists_cheapest_first() {
        let state = AppState::new(seeded_store().await, Duration::from_secs(60));
        let response = app(state, false)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        let cheapest = html.find("Funda Minimalista").unwrap();
        let priciest = html.find("Funda Cuero Premium").unwrap();
        assert!(cheapest < priciest);
    }

    #[tokio::test]
    async fn test_home_filters_by_phone_model() {
        let state = AppState::new(seeded_store().await, Duration::from_secs(60));
        let response = app(state, false)
            .oneshot(
                Request::get("/?phone_model=Phone%2016%20Pro%20Max")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let html = body_text(response).await;
        assert!(html.contains("Funda Gaming RGB"));
        assert!(!html.contains("Funda Minimalista"));
    }

    #[tokio::test]
    async fn test_home_without_table_still_renders() {
        let state = AppState::new(Arc::new(MemoryStore::new()), Duration::from_secs(60));
        let response = app(state, false)
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("no está disponible"));
    }

    #[tokio::test]
    async fn test_visits_are_tracked_per_session() {
        let store = seeded_store().await;
        let state = AppState::new(Arc::clone(&store), Duration::from_secs(60));
        let app = app(state, false);

        let first = app
            .clone()
            .oneshot(
                Request::get("/")
                    .header(header::USER_AGENT, "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0)")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let cookie = session_cookie(&first);

        app.oneshot(
            Request::get("/?phone_model=iPhone%2016")
                .header(header::COOKIE, cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

        let sessions = Repository::<TrackingSession>::new(store).list().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].visit_count, 2);
        assert_eq!(sessions[0].landing_page.as_deref(), Some("/"));
        assert_eq!(sessions[0].device_type.as_deref(), Some("mobile"));
    }

    #[tokio::test]
    async fn test_add_to_cart_updates_badge() {
        let store = seeded_store().await;
        let case_id = Repository::<CaseRecord>::new(Arc::clone(&store))
            .list()
            .await
            .unwrap()[0]
            .id;
        let app = app(AppState::new(store, Duration::from_secs(60)), false);

        let response = app
            .clone()
            .oneshot(
                Request::post("/cart/add")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header("hx-request", "true")
                    .body(Body::from(format!("case_id={case_id}&quantity=2")))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        assert!(body_text(response).await.contains(">2<"));

        let response = app
            .oneshot(
                Request::get("/cart/count")
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(body_text(response).await.contains(">2<"));
    }

    #[tokio::test]
    async fn test_add_case_newer_than_cached_catalog() {
        let store = seeded_store().await;
        let state = AppState::new(Arc::clone(&store), Duration::from_secs(60));
        assert_eq!(state.catalog(None).await.unwrap().len(), 10);

        let mut draft = funda_core::CaseDraft::new("Funda Recién Llegada", "iPhone 16");
        draft.stock = Some(3);
        let added = Repository::<CaseRecord>::new(store)
            .insert_one(&draft)
            .await
            .unwrap();

        let response = app(state.clone(), false)
            .oneshot(
                Request::post("/cart/add")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .header("hx-request", "true")
                    .body(Body::from(format!("case_id={}", added.id)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(state.catalog(None).await.unwrap().len(), 11);
    }

    #[tokio::test]
    async fn test_add_unknown_case_is_not_found() {
        let app = app(
            AppState::new(seeded_store().await, Duration::from_secs(60)),
            false,
        );
        let response = app
            .oneshot(
                Request::post("/cart/add")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(format!("case_id={}", uuid::Uuid::new_v4())))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
