//! Registered users screen.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use funda_core::{Layout, Shell, UserProfile, UserStats};
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
        .route("/users", get(index))
        .route("/users/rows", get(rows))
        .route("/users/setup", post(setup))
        .route("/users/seed", post(seed))
}

/// User row for templates.
#[derive(Debug, Clone)]
pub struct UserView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub postal_code: String,
    pub subscribed: bool,
}

impl From<&UserProfile> for UserView {
    fn from(user: &UserProfile) -> Self {
        Self {
            name: user.full_name(),
            email: user.email.clone(),
            phone: or_dash(user.phone.as_deref()),
            location: or_dash(Some(user.location().as_str())),
            postal_code: or_dash(user.postal_code.as_deref()),
            subscribed: user.newsletter_subscribed,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub country: String,
}

impl UserQuery {
    fn filter(&self) -> Option<(&'static str, &str)> {
        selected(Some(&self.country)).map(|v| ("country", v))
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "users.html")]
pub struct UsersTemplate {
    pub shell: Shell,
    pub current_path: &'static str,
    pub client_id: String,
    pub rows: Vec<UserView>,
    pub stats: UserStats,
    pub countries: Vec<String>,
    pub query: UserQuery,
    pub setup: Option<SetupView>,
    pub notice: Option<Notice>,
}

#[derive(Template, WebTemplate)]
#[template(path = "users.html", block = "rows")]
pub struct UserRowsTemplate {
    pub rows: Vec<UserView>,
}

impl UsersTemplate {
    fn new(page: Page<UserProfile>, query: UserQuery) -> Self {
        let stats = UserStats::compute(&page.rows);
        Self {
            shell: Shell::titled("Usuarios")
                .without_cart()
                .with_layout(Layout::FullWidth),
            current_path: "/users",
            client_id: new_client_id(),
            rows: page.rows.iter().map(UserView::from).collect(),
            countries: stats.by_country.categories().map(String::from).collect(),
            stats,
            query,
            setup: page.setup,
            notice: page.notice,
        }
    }
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, Query(query): Query<UserQuery>) -> UsersTemplate {
    let page = fetch_page(state.users(), None, Some(&query.q), query.filter())
        .await
        .unwrap_or_else(Page::empty);
    UsersTemplate::new(page, query)
}

#[instrument(skip(state, headers))]
pub async fn rows(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<UserQuery>,
) -> Response {
    match fetch_page(state.users(), client_key(&headers), Some(&query.q), query.filter()).await {
        Some(page) => UserRowsTemplate {
            rows: page.rows.iter().map(UserView::from).collect(),
        }
        .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[instrument(skip(state))]
pub async fn setup(State(state): State<AppState>) -> Result<Response, AppError> {
    let notice = state.users().setup().await?;
    let page = reload(state.users(), notice).await;
    Ok(UsersTemplate::new(page, UserQuery::default()).into_response())
}

#[instrument(skip(state))]
pub async fn seed(State(state): State<AppState>) -> Result<Response, AppError> {
    let notice = state.users().seed().await?;
    let page = reload(state.users(), notice).await;
    Ok(UsersTemplate::new(page, UserQuery::default()).into_response())
}
