//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness check
//! GET  /health/ready           - Store reachability check
//!
//! GET  /                       - Dashboard with row counts per table
//!
//! # Cases (fundas)
//! GET  /cases?q=&phone_model=&material=
//! GET  /cases/rows?...         - Table body fragment (204 when superseded)
//! POST /cases/setup            - Create the table
//! POST /cases/seed             - Insert dummy cases
//! POST /cases/{id}/stock       - Set stock level
//!
//! # Mailing list
//! GET  /mails?q=&subscribed=
//! GET  /mails/rows?...
//! POST /mails/setup  POST /mails/seed
//! POST /mails/subscription     - Opt an address in or out
//!
//! # Users
//! GET  /users?q=&country=
//! GET  /users/rows?...
//! POST /users/setup  POST /users/seed
//!
//! # Visitor tracking
//! GET  /tracking?q=&device=
//! GET  /tracking/rows?...
//! POST /tracking/setup  POST /tracking/seed
//! ```

pub mod cases;
pub mod dashboard;
pub mod health;
pub mod mails;
pub mod tracking;
pub mod users;

use axum::Router;
use axum::http::HeaderMap;
use funda_core::Seeded;
use funda_store::StoreError;

use crate::screen::{ALL, CLIENT_HEADER, Dispatch, Notice, Screen, ScreenView};
use crate::state::AppState;

/// Create all routes for the admin screens.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(dashboard::router())
        .merge(cases::router())
        .merge(mails::router())
        .merge(users::router())
        .merge(tracking::router())
}

/// Table setup offer shown when a table cannot be read.
#[derive(Debug, Clone)]
pub struct SetupView {
    pub table: &'static str,
    pub statement: String,
    pub reason: String,
}

/// Rows plus whatever the page shows instead of, or above, them.
#[derive(Debug)]
pub struct Page<E> {
    pub rows: Vec<E>,
    pub setup: Option<SetupView>,
    pub notice: Option<Notice>,
}

impl<E> Page<E> {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            rows: Vec::new(),
            setup: None,
            notice: None,
        }
    }

    #[must_use]
    pub fn with_notice(mut self, notice: Notice) -> Self {
        self.notice = Some(notice);
        self
    }
}

/// Trimmed, non-empty, non-"all" query value.
pub(crate) fn selected(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != ALL)
}

/// Fresh live-search stream id for a rendered page.
pub(crate) fn new_client_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// The live-search stream a fragment request belongs to.
pub(crate) fn client_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CLIENT_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty() && v.len() <= 64)
}

/// Fetch the rows a listing request asks for.
///
/// A search term wins over a filter; with neither, everything is listed.
/// Returns `None` when a newer request from the same `client` superseded
/// this one; unkeyed requests always get a page.
pub(crate) async fn fetch_page<E: Seeded>(
    screen: &Screen<E>,
    client: Option<&str>,
    term: Option<&str>,
    filter: Option<(&str, &str)>,
) -> Option<Page<E>> {
    let dispatched = match (selected(term), filter) {
        (Some(term), _) => screen.search(client, term).await,
        (None, Some((field, value))) => screen.filter(client, field, value).await,
        (None, None) => {
            return Some(match screen.load().await {
                ScreenView::Listing(rows) => Page {
                    rows,
                    ..Page::empty()
                },
                ScreenView::Setup { statement, reason } => Page {
                    rows: Vec::new(),
                    setup: Some(SetupView {
                        table: E::schema().name,
                        statement,
                        reason,
                    }),
                    notice: None,
                },
            });
        }
    };

    match dispatched {
        Ok(Dispatch::Fresh(rows)) => Some(Page {
            rows,
            ..Page::empty()
        }),
        Ok(Dispatch::Superseded) => None,
        Err(e) => Some(failed_page::<E>(&e)),
    }
}

fn failed_page<E: Seeded>(error: &StoreError) -> Page<E> {
    let setup = error.is_missing_table().then(|| SetupView {
        table: E::schema().name,
        statement: E::schema().create_statement(),
        reason: error.to_string(),
    });
    let notice = setup
        .is_none()
        .then(|| Notice::Error(error.to_string()));
    Page {
        rows: Vec::new(),
        setup,
        notice,
    }
}

/// Reload the full listing after a mutation and attach its notice.
pub(crate) async fn reload<E: Seeded>(screen: &Screen<E>, notice: Notice) -> Page<E> {
    fetch_page(screen, None, None, None)
        .await
        .unwrap_or_else(Page::empty)
        .with_notice(notice)
}

/// Text for an optional column.
pub(crate) fn or_dash(value: Option<&str>) -> String {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("-")
        .to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_selected() {
        assert_eq!(selected(Some(" iPhone ")), Some("iPhone"));
        assert_eq!(selected(Some("all")), None);
        assert_eq!(selected(Some("  ")), None);
        assert_eq!(selected(None), None);
    }

    #[test]
    fn test_client_key() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_key(&headers), None);
        headers.insert(CLIENT_HEADER, "  ".parse().unwrap());
        assert_eq!(client_key(&headers), None);
        headers.insert(CLIENT_HEADER, "abc123".parse().unwrap());
        assert_eq!(client_key(&headers), Some("abc123"));
        assert_eq!(new_client_id().len(), 32);
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(None), "-");
        assert_eq!(or_dash(Some("")), "-");
        assert_eq!(or_dash(Some("CDMX")), "CDMX");
    }
}
