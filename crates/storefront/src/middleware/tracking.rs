//! Visitor tracking middleware.
//!
//! The first page view of a session inserts a `users_tracking` row keyed by
//! a generated session id; later page views bump its visit count and current
//! page. Tracking failures are logged and never fail the request.

use axum::{
    extract::{Request, State},
    http::{Method, header},
    middleware::Next,
    response::Response,
};
use funda_core::TrackingDraft;
use funda_store::StoreError;
use tower_sessions::Session;
use uuid::Uuid;

use crate::models::session_keys;
use crate::state::AppState;

/// Paths that are not page views.
const UNTRACKED_PREFIXES: &[&str] = &["/health", "/cart/count"];

fn is_page_view(method: &Method, path: &str) -> bool {
    method == Method::GET && !UNTRACKED_PREFIXES.iter().any(|p| path.starts_with(p))
}

fn header_value(request: &Request, name: header::HeaderName) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Record each page view against the visitor's tracking session.
pub async fn visit_tracking_middleware(
    State(state): State<AppState>,
    session: Session,
    request: Request,
    next: Next,
) -> Response {
    if is_page_view(request.method(), request.uri().path()) {
        let page = request.uri().path().to_string();
        let user_agent = header_value(&request, header::USER_AGENT);
        let referrer = header_value(&request, header::REFERER);
        record_page_view(&state, &session, page, user_agent, referrer).await;
    }

    next.run(request).await
}

async fn record_page_view(
    state: &AppState,
    session: &Session,
    page: String,
    user_agent: Option<String>,
    referrer: Option<String>,
) {
    let tracking_id = session
        .get::<String>(session_keys::TRACKING_ID)
        .await
        .ok()
        .flatten();

    if let Some(id) = tracking_id {
        match state.tracking().record_visit(&id, &page).await {
            Ok(row) => {
                tracing::debug!(session_id = %id, visits = row.visit_count, "visit recorded");
                return;
            }
            // Row removed since the session started; track afresh below.
            Err(StoreError::NotFound) => {}
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "failed to record visit");
                return;
            }
        }
    }

    let id = format!("sess_{}", Uuid::new_v4().simple());
    let draft = TrackingDraft::landing(id.clone(), page, user_agent, referrer);
    match state.tracking().track(&draft).await {
        Ok(_) => {
            if let Err(e) = session.insert(session_keys::TRACKING_ID, &id).await {
                tracing::warn!(error = %e, "failed to store tracking id in session");
            }
            tracing::info!(session_id = %id, device = ?draft.device_type, "new visitor tracked");
        }
        Err(e) => tracing::warn!(error = %e, "failed to track visitor"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_page_view() {
        assert!(is_page_view(&Method::GET, "/"));
        assert!(is_page_view(&Method::GET, "/?phone_model=iPhone%2016"));
        assert!(!is_page_view(&Method::POST, "/cart/add"));
        assert!(!is_page_view(&Method::GET, "/cart/count"));
        assert!(!is_page_view(&Method::GET, "/health/ready"));
    }
}
