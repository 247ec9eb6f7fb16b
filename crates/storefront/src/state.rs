//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use funda_core::{CaseRecord, SortField, TrackingSession};
use funda_store::{Repository, Store, StoreError};
use moka::future::Cache;

/// Cache key for the homepage catalog: `None` is the unfiltered listing.
type CatalogKey = Option<String>;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn Store>,
    cases: Repository<CaseRecord>,
    tracking: Repository<TrackingSession>,
    catalog: Cache<CatalogKey, Arc<Vec<CaseRecord>>>,
}

impl AppState {
    /// Create a new application state over an injected store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, catalog_ttl: Duration) -> Self {
        let catalog = Cache::builder()
            .max_capacity(64)
            .time_to_live(catalog_ttl)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                cases: Repository::new(Arc::clone(&store)),
                tracking: Repository::new(Arc::clone(&store)),
                store,
                catalog,
            }),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }

    #[must_use]
    pub fn tracking(&self) -> &Repository<TrackingSession> {
        &self.inner.tracking
    }

    /// Cases cheapest-first, optionally for one phone model.
    ///
    /// Results are cached per phone model; failures are not cached.
    ///
    /// # Errors
    ///
    /// Store failures from the underlying read.
    pub async fn catalog(&self, phone_model: Option<&str>) -> Result<Arc<Vec<CaseRecord>>, StoreError> {
        let key: CatalogKey = phone_model.map(str::to_string);
        if let Some(hit) = self.inner.catalog.get(&key).await {
            return Ok(hit);
        }

        let cases = match phone_model {
            Some(model) => self.inner.cases.by_phone_model(model).await?,
            None => self.inner.cases.list_all(SortField::asc("price")).await?,
        };
        let cases = Arc::new(cases);
        self.inner.catalog.insert(key, Arc::clone(&cases)).await;
        Ok(cases)
    }

    /// Drop every cached catalog listing.
    pub fn invalidate_catalog(&self) {
        self.inner.catalog.invalidate_all();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use funda_core::{CaseDraft, Seeded};
    use funda_store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_catalog_is_cached() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::with_all_tables());
        let repo: Repository<CaseRecord> = Repository::new(Arc::clone(&store));
        repo.insert(&CaseRecord::seed()).await.unwrap();

        let state = AppState::new(store, Duration::from_secs(60));
        let first = state.catalog(None).await.unwrap();
        assert_eq!(first.len(), 10);
        assert_eq!(first[0].name, "Funda Minimalista");

        repo.insert_one(&CaseDraft::new("Funda Nueva", "iPhone 16")).await.unwrap();
        assert_eq!(state.catalog(None).await.unwrap().len(), 10);

        state.invalidate_catalog();
        assert_eq!(state.catalog(None).await.unwrap().len(), 11);
    }

    #[tokio::test]
    async fn test_catalog_by_phone_model() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::with_all_tables());
        Repository::<CaseRecord>::new(Arc::clone(&store))
            .insert(&CaseRecord::seed())
            .await
            .unwrap();

        let state = AppState::new(store, Duration::from_secs(60));
        let cases = state.catalog(Some("iPhone 16")).await.unwrap();
        assert_eq!(cases.len(), 3);
        assert!(cases.iter().all(|c| c.phone_model == "iPhone 16"));
    }

    #[tokio::test]
    async fn test_missing_table_is_not_cached() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        let state = AppState::new(store, Duration::from_secs(60));
        assert!(state.catalog(None).await.is_err());
        assert!(state.catalog(None).await.is_err());
    }
}
