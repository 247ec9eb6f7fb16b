//! Print aggregate stats as JSON.

use std::sync::Arc;

use funda_core::{
    CaseRecord, EntityKind, InventoryStats, MailEntry, MailStats, TrackingSession, TrackingStats,
    UserProfile, UserStats,
};
use funda_store::{Repository, Store};
use serde_json::Value;

use super::CliError;

/// Stats for `entity` over every row.
///
/// # Errors
///
/// Store failures, or a stats value that cannot be encoded.
pub async fn collect(store: Arc<dyn Store>, entity: EntityKind) -> Result<Value, CliError> {
    let value = match entity {
        EntityKind::Cases => {
            let rows = Repository::<CaseRecord>::new(store).list().await?;
            serde_json::to_value(InventoryStats::compute(&rows))?
        }
        EntityKind::Mails => {
            let rows = Repository::<MailEntry>::new(store).list().await?;
            serde_json::to_value(MailStats::compute(&rows))?
        }
        EntityKind::Users => {
            let rows = Repository::<UserProfile>::new(store).list().await?;
            let stats = UserStats::compute(&rows);
            let mut value = serde_json::to_value(&stats)?;
            value["subscription_rate"] = stats.subscription_rate().into();
            value
        }
        EntityKind::Tracking => {
            let rows = Repository::<TrackingSession>::new(store).list().await?;
            serde_json::to_value(TrackingStats::compute(&rows))?
        }
    };
    Ok(value)
}

/// Print stats for `entity`.
///
/// # Errors
///
/// As for [`collect`].
#[allow(clippy::print_stdout)]
pub async fn run(store: Arc<dyn Store>, entity: EntityKind) -> Result<(), CliError> {
    let value = collect(store, entity).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
