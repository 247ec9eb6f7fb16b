//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Query, State};
use funda_core::{CaseRecord, CurrencyCode, Shell, Tally};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::filters;
use crate::routes::cart::load_cart;
use crate::state::AppState;

/// Case card display data for templates.
#[derive(Debug, Clone)]
pub struct CaseCard {
    pub id: String,
    pub name: String,
    pub phone_model: String,
    pub material: Option<String>,
    pub color: Option<String>,
    pub price: String,
    pub image_url: Option<String>,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub stock: i32,
    pub in_stock: bool,
}

impl From<&CaseRecord> for CaseCard {
    fn from(case: &CaseRecord) -> Self {
        Self {
            id: case.id.to_string(),
            name: case.name.clone(),
            phone_model: case.phone_model.clone(),
            material: case.material.clone(),
            color: case.color.clone(),
            price: case.unit_price(CurrencyCode::MXN).display(),
            image_url: case.image_url.clone(),
            description: case.description.clone(),
            features: case.features.clone(),
            stock: case.stock,
            in_stock: case.in_stock(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HomeQuery {
    #[serde(default)]
    pub phone_model: String,
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub shell: Shell,
    pub cases: Vec<CaseCard>,
    pub phone_models: Vec<String>,
    pub selected: String,
    /// The catalog could not be read.
    pub unavailable: bool,
}

/// Display the home page.
#[instrument(skip(state, session))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<HomeQuery>,
) -> HomeTemplate {
    let cart = load_cart(&session).await;
    let shell = Shell::default()
        .with_cart(&cart)
        .with_classes("home", "header-overlay", "");
    let selected = query.phone_model.trim().to_string();

    let catalog = match state.catalog(None).await {
        Ok(all) => {
            let models = Tally::from_values(all.iter().map(|c| Some(c.phone_model.as_str())));
            let shown = if selected.is_empty() || selected == "all" {
                Ok(all)
            } else {
                state.catalog(Some(&selected)).await
            };
            shown.map(|cases| (cases, models))
        }
        Err(e) => Err(e),
    };

    match catalog {
        Ok((cases, models)) => HomeTemplate {
            shell,
            cases: cases.iter().map(CaseCard::from).collect(),
            phone_models: models.categories().map(String::from).collect(),
            selected,
            unavailable: false,
        },
        Err(e) => {
            tracing::warn!(error = %e, "catalog unavailable");
            HomeTemplate {
                shell,
                cases: Vec::new(),
                phone_models: Vec::new(),
                selected,
                unavailable: true,
            }
        }
    }
}
