//! Visitor tracking screen.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use funda_core::{Layout, Shell, TrackingSession, TrackingStats};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::routes::{
    Page, SetupView, client_key, fetch_page, new_client_id, or_dash, reload, selected,
};
use crate::screen::Notice;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tracking", get(index))
        .route("/tracking/rows", get(rows))
        .route("/tracking/setup", post(setup))
        .route("/tracking/seed", post(seed))
}

/// Tracking session row for templates.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session_id: String,
    pub visitor: String,
    pub email: String,
    pub device: String,
    pub location: String,
    pub landing_page: String,
    pub current_page: String,
    pub visit_count: i32,
    pub last_visit: String,
}

impl From<&TrackingSession> for SessionView {
    fn from(session: &TrackingSession) -> Self {
        let location = [session.city.as_deref(), session.country.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ");
        Self {
            session_id: session.session_id.clone(),
            visitor: session.visitor(),
            email: or_dash(session.email.as_deref()),
            device: or_dash(session.device_type.as_deref()),
            location: or_dash(Some(location.as_str())),
            landing_page: or_dash(session.landing_page.as_deref()),
            current_page: or_dash(session.current_page.as_deref()),
            visit_count: session.visit_count,
            last_visit: session
                .last_visit
                .map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackingQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub device: String,
}

impl TrackingQuery {
    fn filter(&self) -> Option<(&'static str, &str)> {
        selected(Some(&self.device)).map(|v| ("device_type", v))
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "tracking.html")]
pub struct TrackingTemplate {
    pub shell: Shell,
    pub current_path: &'static str,
    pub client_id: String,
    pub rows: Vec<SessionView>,
    pub stats: TrackingStats,
    pub devices: Vec<(String, usize)>,
    pub query: TrackingQuery,
    pub setup: Option<SetupView>,
    pub notice: Option<Notice>,
}

#[derive(Template, WebTemplate)]
#[template(path = "tracking.html", block = "rows")]
pub struct TrackingRowsTemplate {
    pub rows: Vec<SessionView>,
}

impl TrackingTemplate {
    fn new(page: Page<TrackingSession>, query: TrackingQuery) -> Self {
        let stats = TrackingStats::compute(&page.rows);
        Self {
            shell: Shell::titled("Tracking")
                .without_cart()
                .with_layout(Layout::FullWidth),
            current_path: "/tracking",
            client_id: new_client_id(),
            rows: page.rows.iter().map(SessionView::from).collect(),
            devices: stats
                .by_device
                .ranked()
                .into_iter()
                .map(|(device, n)| (device.to_string(), n))
                .collect(),
            stats,
            query,
            setup: page.setup,
            notice: page.notice,
        }
    }
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, Query(query): Query<TrackingQuery>) -> TrackingTemplate {
    let page = fetch_page(state.tracking(), None, Some(&query.q), query.filter())
        .await
        .unwrap_or_else(Page::empty);
    TrackingTemplate::new(page, query)
}

#[instrument(skip(state, headers))]
pub async fn rows(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TrackingQuery>,
) -> Response {
    match fetch_page(state.tracking(), client_key(&headers), Some(&query.q), query.filter()).await {
        Some(page) => TrackingRowsTemplate {
            rows: page.rows.iter().map(SessionView::from).collect(),
        }
        .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[instrument(skip(state))]
pub async fn setup(State(state): State<AppState>) -> Result<Response, AppError> {
    let notice = state.tracking().setup().await?;
    let page = reload(state.tracking(), notice).await;
    Ok(TrackingTemplate::new(page, TrackingQuery::default()).into_response())
}

#[instrument(skip(state))]
pub async fn seed(State(state): State<AppState>) -> Result<Response, AppError> {
    let notice = state.tracking().seed().await?;
    let page = reload(state.tracking(), notice).await;
    Ok(TrackingTemplate::new(page, TrackingQuery::default()).into_response())
}
