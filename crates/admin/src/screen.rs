//! Per-entity screen controller.
//!
//! A screen owns the repository and bootstrapper for one table plus the two
//! guards that order its work: a [`RequestSequencer`] per client so an older
//! live search never overwrites a newer one from the same page, and a
//! [`BusyFlag`] so two mutations never run at once.
//!
//! A client is one rendered page; it identifies its live-search stream with
//! the [`CLIENT_HEADER`] value the page was rendered with. Requests without
//! it (plain navigation) are never superseded.

use std::sync::Arc;
use std::time::Duration;

use funda_core::Seeded;
use funda_store::{
    Bootstrap, Bootstrapper, BusyFlag, Repository, RequestSequencer, SchemaError, Store,
    StoreError,
};
use moka::future::Cache;
use thiserror::Error;
use tracing::instrument;

/// Value of a filter dropdown meaning "no filter".
pub const ALL: &str = "all";

/// Header carrying the page's live-search stream id.
pub const CLIENT_HEADER: &str = "x-funda-client";

/// Idle pages drop their sequencer after this long.
const CLIENT_IDLE: Duration = Duration::from_secs(30 * 60);
const MAX_CLIENTS: u64 = 10_000;

#[derive(Debug, Error)]
pub enum ScreenError {
    #[error("another operation is in progress")]
    Busy,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What the screen shows after loading.
#[derive(Debug)]
pub enum ScreenView<E> {
    Listing(Vec<E>),
    /// The table could not be read; offer the create action and the raw DDL.
    Setup { statement: String, reason: String },
}

/// Result of a sequenced read.
#[derive(Debug)]
pub enum Dispatch<E> {
    Fresh(Vec<E>),
    /// A newer request was issued while this one ran.
    Superseded,
}

/// User-facing outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success(String),
    /// Partial success; `statement` is SQL the operator must run by hand.
    Warning {
        message: String,
        statement: Option<String>,
    },
    Error(String),
}

impl Notice {
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Success(m) | Self::Error(m) | Self::Warning { message: m, .. } => m,
        }
    }

    /// CSS modifier for the notice banner.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::Warning { .. } => "warning",
            Self::Error(_) => "error",
        }
    }

    #[must_use]
    pub fn statement(&self) -> Option<&str> {
        match self {
            Self::Warning { statement, .. } => statement.as_deref(),
            _ => None,
        }
    }
}

struct Ticket {
    sequencer: Arc<RequestSequencer>,
    number: u64,
}

impl Ticket {
    fn is_current(&self) -> bool {
        self.sequencer.is_current(self.number)
    }
}

/// Controller for one entity's admin screen.
pub struct Screen<E: Seeded> {
    repo: Repository<E>,
    bootstrapper: Bootstrapper,
    sequencers: Cache<String, Arc<RequestSequencer>>,
    busy: BusyFlag,
}

impl<E: Seeded> std::fmt::Debug for Screen<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("table", &E::schema().name)
            .field("busy", &self.busy.is_busy())
            .finish_non_exhaustive()
    }
}

impl<E: Seeded> Screen<E> {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            repo: Repository::new(Arc::clone(&store)),
            bootstrapper: Bootstrapper::new(store),
            sequencers: Cache::builder()
                .max_capacity(MAX_CLIENTS)
                .time_to_idle(CLIENT_IDLE)
                .build(),
            busy: BusyFlag::new(),
        }
    }

    #[must_use]
    pub const fn repo(&self) -> &Repository<E> {
        &self.repo
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    /// List everything, or the setup view when the table cannot be read.
    #[instrument(skip(self), fields(table = E::schema().name))]
    pub async fn load(&self) -> ScreenView<E> {
        match self.repo.list().await {
            Ok(rows) => ScreenView::Listing(rows),
            Err(e) => {
                tracing::warn!(error = %e, "listing failed, offering setup");
                ScreenView::Setup {
                    statement: E::schema().create_statement(),
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn ticket(&self, client: Option<&str>) -> Option<Ticket> {
        let sequencer = self
            .sequencers
            .get_with(client?.to_string(), async { Arc::new(RequestSequencer::new()) })
            .await;
        let number = sequencer.issue();
        Some(Ticket { sequencer, number })
    }

    /// Substring search, sequenced per `client`. A blank term lists everything.
    ///
    /// # Errors
    ///
    /// Store failures of a request that is still current.
    pub async fn search(&self, client: Option<&str>, term: &str) -> Result<Dispatch<E>, StoreError> {
        let ticket = self.ticket(client).await;
        let result = self.repo.search(term).await;
        Self::dispatch(ticket.as_ref(), result)
    }

    /// Equality filter, sequenced per `client`. A blank value or [`ALL`]
    /// lists everything.
    ///
    /// # Errors
    ///
    /// `UnknownField` for a bad field, otherwise store failures of a request
    /// that is still current.
    pub async fn filter(
        &self,
        client: Option<&str>,
        field: &str,
        value: &str,
    ) -> Result<Dispatch<E>, StoreError> {
        let ticket = self.ticket(client).await;
        let value = value.trim();
        let result = if value.is_empty() || value == ALL {
            self.repo.list().await
        } else {
            self.repo.filter_by(field, value).await
        };
        Self::dispatch(ticket.as_ref(), result)
    }

    /// Superseded replies are dropped whether they carry rows or an error.
    fn dispatch(
        ticket: Option<&Ticket>,
        result: Result<Vec<E>, StoreError>,
    ) -> Result<Dispatch<E>, StoreError> {
        if let Some(ticket) = ticket.filter(|t| !t.is_current()) {
            tracing::debug!(
                table = E::schema().name,
                ticket = ticket.number,
                failed = result.is_err(),
                "discarding superseded response"
            );
            return Ok(Dispatch::Superseded);
        }
        result.map(Dispatch::Fresh)
    }

    /// Create the table.
    ///
    /// # Errors
    ///
    /// `Busy` when another mutation holds the screen.
    #[instrument(skip(self), fields(table = E::schema().name))]
    pub async fn setup(&self) -> Result<Notice, ScreenError> {
        let _guard = self.busy.try_acquire().ok_or(ScreenError::Busy)?;
        let table = E::schema().name;

        Ok(match self.bootstrapper.ensure_table(E::schema()).await {
            Ok(Bootstrap::Created) => Notice::Success(format!("Table {table} created")),
            Ok(Bootstrap::AlreadyExisted) => Notice::Success(format!("Table {table} already exists")),
            Err(SchemaError::UnsupportedRemoteExecution { statement }) => Notice::Warning {
                message: format!(
                    "The store cannot run schema statements. Run this SQL manually to create {table}."
                ),
                statement: Some(statement),
            },
            Err(e) => Notice::Error(format!("Could not create {table}: {e}")),
        })
    }

    /// Insert the dummy rows.
    ///
    /// # Errors
    ///
    /// `Busy` when another mutation holds the screen.
    #[instrument(skip(self), fields(table = E::schema().name))]
    pub async fn seed(&self) -> Result<Notice, ScreenError> {
        let _guard = self.busy.try_acquire().ok_or(ScreenError::Busy)?;
        let table = E::schema().name;

        Ok(match self.repo.insert(&E::seed()).await {
            Ok(rows) => Notice::Success(format!("Inserted {} rows into {table}", rows.len())),
            Err(e) => Notice::Error(format!("Could not insert dummy {table}: {e}")),
        })
    }

    /// Run a mutation while holding the busy flag.
    ///
    /// # Errors
    ///
    /// `Busy` when another mutation holds the screen, otherwise the
    /// mutation's own error.
    pub async fn exclusive<T, F>(&self, mutation: F) -> Result<T, ScreenError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let _guard = self.busy.try_acquire().ok_or(ScreenError::Busy)?;
        Ok(mutation.await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use funda_core::{CaseRecord, MailEntry, UserProfile};
    use funda_store::MemoryStore;

    use super::*;

    fn screen<E: Seeded>(store: MemoryStore) -> Screen<E> {
        Screen::new(Arc::new(store))
    }

    #[tokio::test]
    async fn test_load_missing_table_offers_setup() {
        let screen: Screen<CaseRecord> = screen(MemoryStore::new());
        match screen.load().await {
            ScreenView::Setup { statement, reason } => {
                assert!(statement.starts_with("CREATE TABLE IF NOT EXISTS fundas"));
                assert!(reason.contains("fundas"));
            }
            ScreenView::Listing(_) => panic!("expected setup view"),
        }
    }

    #[tokio::test]
    async fn test_setup_then_seed_then_load() {
        let screen: Screen<CaseRecord> = screen(MemoryStore::new());
        assert_eq!(
            screen.setup().await.unwrap(),
            Notice::Success("Table fundas created".to_string())
        );
        assert_eq!(
            screen.seed().await.unwrap(),
            Notice::Success("Inserted 10 rows into fundas".to_string())
        );
        match screen.load().await {
            ScreenView::Listing(rows) => assert_eq!(rows.len(), 10),
            ScreenView::Setup { .. } => panic!("expected listing"),
        }
    }

    #[tokio::test]
    async fn test_setup_without_remote_execution_warns_with_sql() {
        let screen: Screen<UserProfile> = screen(MemoryStore::new().without_remote_execution());
        let notice = screen.setup().await.unwrap();
        assert_eq!(notice.kind(), "warning");
        assert!(notice.statement().unwrap().contains("CREATE TABLE IF NOT EXISTS users"));
    }

    #[tokio::test]
    async fn test_seed_twice_reports_duplicate() {
        let screen: Screen<MailEntry> = screen(MemoryStore::with_all_tables());
        screen.seed().await.unwrap();
        let notice = screen.seed().await.unwrap();
        assert_eq!(notice.kind(), "error");
        assert_eq!(screen.repo().count().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_filter_all_lists_everything() {
        let screen: Screen<CaseRecord> = screen(MemoryStore::with_all_tables());
        screen.seed().await.unwrap();
        let Dispatch::Fresh(rows) = screen.filter(None, "material", ALL).await.unwrap() else {
            panic!("expected fresh rows");
        };
        assert_eq!(rows.len(), 10);
    }

    #[tokio::test]
    async fn test_older_search_is_superseded() {
        let store = MemoryStore::with_all_tables().with_latency(Duration::from_millis(50));
        let screen: Arc<Screen<CaseRecord>> = Arc::new(screen(store));

        let slow = {
            let screen = Arc::clone(&screen);
            tokio::spawn(async move { screen.search(Some("page-a"), "iphone").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let fast = screen.search(Some("page-a"), "galaxy").await.unwrap();

        assert!(matches!(slow.await.unwrap().unwrap(), Dispatch::Superseded));
        assert!(matches!(fast, Dispatch::Fresh(_)));
    }

    #[tokio::test]
    async fn test_clients_do_not_supersede_each_other() {
        let store = MemoryStore::with_all_tables().with_latency(Duration::from_millis(50));
        let screen: Arc<Screen<CaseRecord>> = Arc::new(screen(store));

        let first = {
            let screen = Arc::clone(&screen);
            tokio::spawn(async move { screen.search(Some("page-a"), "iphone").await })
        };
        let unkeyed = {
            let screen = Arc::clone(&screen);
            tokio::spawn(async move { screen.search(None, "iphone").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let other = screen.search(Some("page-b"), "galaxy").await.unwrap();

        assert!(matches!(first.await.unwrap().unwrap(), Dispatch::Fresh(_)));
        assert!(matches!(unkeyed.await.unwrap().unwrap(), Dispatch::Fresh(_)));
        assert!(matches!(other, Dispatch::Fresh(_)));
    }

    #[tokio::test]
    async fn test_superseded_failure_is_dropped() {
        let store = MemoryStore::new().with_latency(Duration::from_millis(50));
        let screen: Arc<Screen<CaseRecord>> = Arc::new(screen(store));

        let older = {
            let screen = Arc::clone(&screen);
            tokio::spawn(async move { screen.search(Some("page-a"), "iphone").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let newer = screen.search(Some("page-a"), "galaxy").await;

        assert!(matches!(older.await.unwrap(), Ok(Dispatch::Superseded)));
        assert!(matches!(newer, Err(StoreError::MissingTable(_))));
    }

    #[tokio::test]
    async fn test_current_failure_is_reported() {
        let screen: Screen<CaseRecord> = screen(MemoryStore::with_all_tables());
        assert!(matches!(
            screen.filter(Some("page-a"), "password", "x").await,
            Err(StoreError::UnknownField(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_mutation_is_rejected() {
        let store = MemoryStore::with_all_tables().with_latency(Duration::from_millis(50));
        let screen: Arc<Screen<CaseRecord>> = Arc::new(screen(store));

        let first = {
            let screen = Arc::clone(&screen);
            tokio::spawn(async move { screen.seed().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(matches!(screen.seed().await, Err(ScreenError::Busy)));
        assert!(matches!(first.await.unwrap(), Ok(Notice::Success(_))));
        assert!(!screen.is_busy());
    }
}
