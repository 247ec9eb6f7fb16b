//! Insert dummy rows.

use std::sync::Arc;

use funda_core::{CaseRecord, EntityKind, MailEntry, Seeded, TrackingSession, UserProfile};
use funda_store::{Repository, Store, StoreError};
use tracing::info;

use super::CliError;

/// Insert the dummy rows for `entity` as one batch.
///
/// # Errors
///
/// Store failures; a rerun fails on the unique columns and inserts nothing.
pub async fn run(store: Arc<dyn Store>, entity: EntityKind) -> Result<(), CliError> {
    let inserted = match entity {
        EntityKind::Cases => insert::<CaseRecord>(store).await?,
        EntityKind::Mails => insert::<MailEntry>(store).await?,
        EntityKind::Users => insert::<UserProfile>(store).await?,
        EntityKind::Tracking => insert::<TrackingSession>(store).await?,
    };
    info!(table = entity.schema().name, rows = inserted, "dummy rows inserted");
    Ok(())
}

async fn insert<E: Seeded>(store: Arc<dyn Store>) -> Result<usize, StoreError> {
    let rows = Repository::<E>::new(store).insert(&E::seed()).await?;
    Ok(rows.len())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use funda_store::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_seed_twice_fails_on_unique_email() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::with_all_tables());
        run(Arc::clone(&store), EntityKind::Mails).await.unwrap();
        assert!(matches!(
            run(Arc::clone(&store), EntityKind::Mails).await,
            Err(CliError::Store(StoreError::ConstraintViolation(_)))
        ));
        assert_eq!(Repository::<MailEntry>::new(store).count().await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_seed_missing_table() {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        assert!(matches!(
            run(store, EntityKind::Tracking).await,
            Err(CliError::Store(StoreError::MissingTable(_)))
        ));
    }
}
