//! Case inventory screen.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use funda_core::{CaseId, CaseRecord, CurrencyCode, InventoryStats, Layout, Shell};
use serde::Deserialize;
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::routes::{
    Page, SetupView, client_key, fetch_page, new_client_id, or_dash, reload, selected,
};
use crate::screen::{Notice, ScreenError};
use crate::state::AppState;

/// Build the cases router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cases", get(index))
        .route("/cases/rows", get(rows))
        .route("/cases/setup", post(setup))
        .route("/cases/seed", post(seed))
        .route("/cases/{id}/stock", post(update_stock))
}

// =============================================================================
// Views
// =============================================================================

/// Case row for templates.
#[derive(Debug, Clone)]
pub struct CaseView {
    pub id: String,
    pub name: String,
    pub phone_model: String,
    pub material: String,
    pub color: String,
    pub brand: String,
    pub price: String,
    pub stock: i32,
    pub in_stock: bool,
}

impl From<&CaseRecord> for CaseView {
    fn from(case: &CaseRecord) -> Self {
        Self {
            id: case.id.to_string(),
            name: case.name.clone(),
            phone_model: case.phone_model.clone(),
            material: or_dash(case.material.as_deref()),
            color: or_dash(case.color.as_deref()),
            brand: or_dash(case.brand.as_deref()),
            price: case.unit_price(CurrencyCode::MXN).display(),
            stock: case.stock,
            in_stock: case.in_stock(),
        }
    }
}

/// Query parameters for the case listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CaseQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub phone_model: String,
    #[serde(default)]
    pub material: String,
}

impl CaseQuery {
    fn filter(&self) -> Option<(&'static str, &str)> {
        selected(Some(&self.phone_model))
            .map(|v| ("phone_model", v))
            .or_else(|| selected(Some(&self.material)).map(|v| ("material", v)))
    }
}

/// Form data for a stock update.
#[derive(Debug, Deserialize)]
pub struct StockForm {
    pub stock: i32,
}

// =============================================================================
// Templates
// =============================================================================

/// Case inventory page.
#[derive(Template, WebTemplate)]
#[template(path = "cases.html")]
pub struct CasesTemplate {
    pub shell: Shell,
    pub current_path: &'static str,
    pub client_id: String,
    pub rows: Vec<CaseView>,
    pub stats: InventoryStats,
    pub phone_models: Vec<String>,
    pub materials: Vec<String>,
    pub query: CaseQuery,
    pub setup: Option<SetupView>,
    pub notice: Option<Notice>,
}

/// Table body fragment for live search.
#[derive(Template, WebTemplate)]
#[template(path = "cases.html", block = "rows")]
pub struct CaseRowsTemplate {
    pub rows: Vec<CaseView>,
}

impl CasesTemplate {
    fn new(page: Page<CaseRecord>, query: CaseQuery) -> Self {
        let stats = InventoryStats::compute(&page.rows);
        Self {
            shell: Shell::titled("Fundas")
                .without_cart()
                .with_layout(Layout::FullWidth),
            current_path: "/cases",
            client_id: new_client_id(),
            rows: page.rows.iter().map(CaseView::from).collect(),
            phone_models: stats.by_phone_model.categories().map(String::from).collect(),
            materials: stats.by_material.categories().map(String::from).collect(),
            stats,
            query,
            setup: page.setup,
            notice: page.notice,
        }
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// Case listing with optional search and filters.
#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>, Query(query): Query<CaseQuery>) -> CasesTemplate {
    let page = fetch_page(state.cases(), None, Some(&query.q), query.filter())
        .await
        .unwrap_or_else(Page::empty);
    CasesTemplate::new(page, query)
}

/// Table body only; 204 when a newer request from the same page superseded this one.
#[instrument(skip(state, headers))]
pub async fn rows(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<CaseQuery>,
) -> Response {
    match fetch_page(state.cases(), client_key(&headers), Some(&query.q), query.filter()).await {
        Some(page) => CaseRowsTemplate {
            rows: page.rows.iter().map(CaseView::from).collect(),
        }
        .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Create the `fundas` table.
#[instrument(skip(state))]
pub async fn setup(State(state): State<AppState>) -> Result<Response, AppError> {
    let notice = state.cases().setup().await?;
    let page = reload(state.cases(), notice).await;
    Ok(CasesTemplate::new(page, CaseQuery::default()).into_response())
}

/// Insert the ten dummy cases.
#[instrument(skip(state))]
pub async fn seed(State(state): State<AppState>) -> Result<Response, AppError> {
    let notice = state.cases().seed().await?;
    let page = reload(state.cases(), notice).await;
    Ok(CasesTemplate::new(page, CaseQuery::default()).into_response())
}

/// Set the stock level of one case.
#[instrument(skip(state))]
pub async fn update_stock(
    State(state): State<AppState>,
    Path(id): Path<CaseId>,
    Form(form): Form<StockForm>,
) -> Result<Response, AppError> {
    let screen = state.cases();
    let notice = match screen
        .exclusive(screen.repo().update_stock(id, form.stock))
        .await
    {
        Ok(case) => Notice::Success(format!("Stock for {} set to {}", case.name, case.stock)),
        Err(ScreenError::Busy) => return Err(AppError::Busy),
        Err(ScreenError::Store(e)) => Notice::Error(format!("Could not update stock: {e}")),
    };
    let page = reload(screen, notice).await;
    Ok(CasesTemplate::new(page, CaseQuery::default()).into_response())
}
