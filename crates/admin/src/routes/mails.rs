//! Mailing list screen.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use funda_core::{MailEntry, MailStats, Shell};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::routes::{
    Page, SetupView, client_key, fetch_page, new_client_id, or_dash, reload, selected,
};
use crate::screen::{Notice, ScreenError};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/mails", get(index))
        .route("/mails/rows", get(rows))
        .route("/mails/setup", post(setup))
        .route("/mails/seed", post(seed))
        .route("/mails/subscription", post(subscription))
}

/// Mailing list row for templates.
#[derive(Debug, Clone)]
pub struct MailView {
    pub email: String,
    pub name: String,
    pub phone: String,
    pub source: String,
    pub tags: String,
    pub subscribed: bool,
    pub joined: String,
}

impl From<&MailEntry> for MailView {
    fn from(mail: &MailEntry) -> Self {
        Self {
            email: mail.email.clone(),
            name: mail.display_name(),
            phone: or_dash(mail.phone.as_deref()),
            source: or_dash(mail.source.as_deref()),
            tags: mail.tags.join(", "),
            subscribed: mail.subscribed,
            joined: mail.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MailQuery {
    #[serde(default)]
    pub q: String,
    /// "true", "false" or "all".
    #[serde(default)]
    pub subscribed: String,
}

impl MailQuery {
    fn filter(&self) -> Option<(&'static str, &str)> {
        selected(Some(&self.subscribed)).map(|v| ("subscribed", v))
    }
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionForm {
    pub email: String,
    pub subscribed: bool,
}

#[derive(Template, WebTemplate)]
#[template(path = "mails.html")]
pub struct MailsTemplate {
    pub shell: Shell,
    pub current_path: &'static str,
    pub client_id: String,
    pub rows: Vec<MailView>,
    pub stats: MailStats,
    pub query: MailQuery,
    pub setup: Option<SetupView>,
    pub notice: Option<Notice>,
}

#[derive(Template, WebTemplate)]
#[template(path = "mails.html", block = "rows")]
pub struct MailRowsTemplate {
    pub rows: Vec<MailView>,
}

impl MailsTemplate {
    fn new(page: Page<MailEntry>, query: MailQuery) -> Self {
        Self {
            shell: Shell::titled("Mails").without_cart(),
            current_path: "/mails",
            client_id: new_client_id(),
            rows: page.rows.iter().map(MailView::from).collect(),
            stats: MailStats::compute(&page.rows),
            query,
            setup: page.setup,
            notice: page.notice,
        }
    }
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, Query(query): Query<MailQuery>) -> MailsTemplate {
    let page = fetch_page(state.mails(), None, Some(&query.q), query.filter())
        .await
        .unwrap_or_else(Page::empty);
    MailsTemplate::new(page, query)
}

#[instrument(skip(state, headers))]
pub async fn rows(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<MailQuery>,
) -> Response {
    match fetch_page(state.mails(), client_key(&headers), Some(&query.q), query.filter()).await {
        Some(page) => MailRowsTemplate {
            rows: page.rows.iter().map(MailView::from).collect(),
        }
        .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

#[instrument(skip(state))]
pub async fn setup(State(state): State<AppState>) -> Result<Response, AppError> {
    let notice = state.mails().setup().await?;
    let page = reload(state.mails(), notice).await;
    Ok(MailsTemplate::new(page, MailQuery::default()).into_response())
}

#[instrument(skip(state))]
pub async fn seed(State(state): State<AppState>) -> Result<Response, AppError> {
    let notice = state.mails().seed().await?;
    let page = reload(state.mails(), notice).await;
    Ok(MailsTemplate::new(page, MailQuery::default()).into_response())
}

/// Opt an address in or out of the mailing list.
#[instrument(skip(state, form), fields(subscribed = form.subscribed))]
pub async fn subscription(
    State(state): State<AppState>,
    Form(form): Form<SubscriptionForm>,
) -> Result<Response, AppError> {
    let email = form.email.trim();
    if email.is_empty() {
        return Err(AppError::BadRequest("email is required".to_string()));
    }

    let screen = state.mails();
    let notice = match screen
        .exclusive(screen.repo().set_subscribed(email, form.subscribed))
        .await
    {
        Ok(mail) if mail.subscribed => Notice::Success(format!("{} subscribed", mail.email)),
        Ok(mail) => Notice::Success(format!("{} unsubscribed", mail.email)),
        Err(ScreenError::Busy) => return Err(AppError::Busy),
        Err(ScreenError::Store(e)) => Notice::Error(format!("Could not update {email}: {e}")),
    };
    let page = reload(screen, notice).await;
    Ok(MailsTemplate::new(page, MailQuery::default()).into_response())
}
