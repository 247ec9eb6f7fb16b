//! Application state shared across handlers.

use std::sync::Arc;

use funda_core::{CaseRecord, MailEntry, TrackingSession, UserProfile};
use funda_store::Store;

use crate::screen::Screen;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. Each screen keeps its own
/// busy flag and request sequencer for the lifetime of the process.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn Store>,
    cases: Screen<CaseRecord>,
    mails: Screen<MailEntry>,
    users: Screen<UserProfile>,
    tracking: Screen<TrackingSession>,
}

impl AppState {
    /// Create a new application state over an injected store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cases: Screen::new(Arc::clone(&store)),
                mails: Screen::new(Arc::clone(&store)),
                users: Screen::new(Arc::clone(&store)),
                tracking: Screen::new(Arc::clone(&store)),
                store,
            }),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    #[must_use]
    pub fn cases(&self) -> &Screen<CaseRecord> {
        &self.inner.cases
    }

    #[must_use]
    pub fn mails(&self) -> &Screen<MailEntry> {
        &self.inner.mails
    }

    #[must_use]
    pub fn users(&self) -> &Screen<UserProfile> {
        &self.inner.users
    }

    #[must_use]
    pub fn tracking(&self) -> &Screen<TrackingSession> {
        &self.inner.tracking
    }
}
