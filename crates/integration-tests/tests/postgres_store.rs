//! The repository flows against a real `PostgreSQL` database.
//!
//! These tests require `DATABASE_URL` pointing at a scratch database. Tables
//! are created if missing; rows use unique values so reruns do not collide.
//!
//! Run with: cargo test -p funda-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use funda_core::{
    CaseDraft, CaseRecord, EntityKind, MailDraft, MailEntry, TrackingDraft, TrackingSession,
};
use rust_decimal::Decimal;
use funda_integration_tests::unique;
use funda_store::{Bootstrapper, PostgresStore, Repository, Store, StoreError};
use secrecy::SecretString;

async fn store() -> Arc<dyn Store> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let store: Arc<dyn Store> = Arc::new(
        PostgresStore::connect(&SecretString::from(url))
            .await
            .unwrap(),
    );
    let bootstrapper = Bootstrapper::new(Arc::clone(&store));
    for entity in EntityKind::ALL {
        bootstrapper.ensure_table(entity.schema()).await.unwrap();
    }
    store
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_postgres_unique_email() {
    let repo = Repository::<MailEntry>::new(store().await);
    let email = format!("{}@funda.mx", unique("pg"));

    repo.insert_one(&MailDraft::new(&email)).await.unwrap();
    assert!(matches!(
        repo.insert_one(&MailDraft::new(&email)).await,
        Err(StoreError::ConstraintViolation(_))
    ));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_postgres_record_visit() {
    let repo = Repository::<TrackingSession>::new(store().await);
    let session_id = unique("sess");

    repo.track(&TrackingDraft::landing(session_id.as_str(), "/", None, None))
        .await
        .unwrap();
    let visited = repo.record_visit(&session_id, "/?phone_model=iPhone%2016").await.unwrap();

    assert_eq!(visited.visit_count, 2);
    assert!(visited.last_visit.is_some());
    assert_eq!(visited.landing_page.as_deref(), Some("/"));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_postgres_search_escapes_wildcards() {
    let repo = Repository::<MailEntry>::new(store().await);
    let rows = repo.search("%_%").await.unwrap();
    assert!(rows.iter().all(|m| m.email.contains("%_%")));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_postgres_filter_by_price() {
    let repo = Repository::<CaseRecord>::new(store().await);
    let mut draft = CaseDraft::new(unique("Funda Precio"), "iPhone 16");
    draft.price = Some(Decimal::new(29_913, 2));
    let inserted = repo.insert_one(&draft).await.unwrap();

    let rows = repo.filter_by("price", "299.13").await.unwrap();
    assert!(rows.iter().any(|c| c.id == inserted.id));
    assert!(rows.iter().all(|c| c.price == Decimal::new(29_913, 2)));
}

#[tokio::test]
#[ignore = "Requires DATABASE_URL"]
async fn test_postgres_canonical_email_key() {
    let repo = Repository::<MailEntry>::new(store().await);
    let local = unique("pg");
    repo.insert_one(&MailDraft::new(format!("  {local}@FUNDA.MX ")))
        .await
        .unwrap();

    let updated = repo
        .set_subscribed(&format!("{local}@Funda.mx"), false)
        .await
        .unwrap();
    assert_eq!(updated.email, format!("{local}@funda.mx"));
    assert!(!updated.subscribed);
}
