//! Cart route handlers.
//!
//! The cart lives in the session as a list of case ids and quantities; only
//! its item count is ever shown (the header badge).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Redirect, Response},
};
use funda_core::{CaseId, CaseRecord, Shell};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::models::{Cart, session_keys};
use crate::state::AppState;

// =============================================================================
// Session Helpers
// =============================================================================

/// Read the cart from the session; empty when absent or unreadable.
pub async fn load_cart(session: &Session) -> Cart {
    session
        .get::<Cart>(session_keys::CART)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(session_keys::CART, cart).await?;
    Ok(())
}

/// Look a case up in the cached catalog.
///
/// A miss drops the cache and reads once more, so a case added since the
/// catalog was cached can still be bought.
async fn find_case(state: &AppState, id: CaseId) -> Result<Option<CaseRecord>> {
    let cached = state.catalog(None).await?;
    if let Some(case) = cached.iter().find(|c| c.id == id) {
        return Ok(Some(case.clone()));
    }
    state.invalidate_catalog();
    let fresh = state.catalog(None).await?;
    Ok(fresh.iter().find(|c| c.id == id).cloned())
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub case_id: CaseId,
    pub quantity: Option<u32>,
}

/// Cart badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub badge: Option<String>,
}

impl CartCountTemplate {
    fn for_cart(cart: &Cart) -> Self {
        Self {
            badge: Shell::default().with_cart(cart).cart_badge(),
        }
    }
}

/// Add a case to the cart.
///
/// HTMX requests get the updated badge; plain form posts go back home.
#[instrument(skip(state, session, headers))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    headers: HeaderMap,
    Form(form): Form<AddToCartForm>,
) -> Result<Response> {
    let quantity = form.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::BadRequest("quantity must be at least 1".to_string()));
    }

    let case = find_case(&state, form.case_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("case {}", form.case_id)))?;
    if !case.in_stock() {
        return Err(AppError::BadRequest(format!("{} is out of stock", case.name)));
    }

    let mut cart = load_cart(&session).await;
    cart.add(case.id, quantity);
    save_cart(&session, &cart).await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        &[("case_id", &case.id.to_string()), ("phone_model", &case.phone_model)],
    );

    if headers.contains_key("hx-request") {
        Ok(CartCountTemplate::for_cart(&cart).into_response())
    } else {
        Ok(Redirect::to("/").into_response())
    }
}

/// Cart badge fragment.
#[instrument(skip(session))]
pub async fn count(session: Session) -> CartCountTemplate {
    CartCountTemplate::for_cart(&load_cart(&session).await)
}
