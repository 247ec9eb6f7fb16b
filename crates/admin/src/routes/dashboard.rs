//! Dashboard with one row count per table.

use askama::Template;
use askama_web::WebTemplate;
use axum::{Router, extract::State, routing::get};
use funda_core::{Entity, Shell};
use funda_store::Repository;
use tracing::instrument;

use crate::filters;
use crate::routes::new_client_id;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(index))
}

/// One dashboard card.
#[derive(Debug, Clone)]
pub struct TableCard {
    pub table: &'static str,
    pub label: &'static str,
    pub href: &'static str,
    /// Row count, or "-" when the table cannot be read.
    pub count: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub shell: Shell,
    pub current_path: &'static str,
    pub client_id: String,
    pub cards: Vec<TableCard>,
}

async fn card<E: Entity>(
    repo: &Repository<E>,
    label: &'static str,
    href: &'static str,
) -> TableCard {
    let count = match repo.count().await {
        Ok(n) => n.to_string(),
        Err(e) => {
            tracing::warn!(table = E::schema().name, error = %e, "count failed");
            "-".to_string()
        }
    };
    TableCard {
        table: E::schema().name,
        label,
        href,
        count,
    }
}

#[instrument(skip(state))]
pub async fn index(State(state): State<AppState>) -> DashboardTemplate {
    let (cases, mails, users, tracking) = tokio::join!(
        card(state.cases().repo(), "Fundas", "/cases"),
        card(state.mails().repo(), "Mails", "/mails"),
        card(state.users().repo(), "Usuarios", "/users"),
        card(state.tracking().repo(), "Tracking", "/tracking"),
    );

    DashboardTemplate {
        shell: Shell::titled("Inicio").without_cart(),
        current_path: "/",
        client_id: new_client_id(),
        cards: vec![cases, mails, users, tracking],
    }
}
