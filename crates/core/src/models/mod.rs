//! Entity records, insert drafts and their table descriptors.
//!
//! Records are what the store returns; every column is present. Drafts are
//! what `insert` accepts; unset optional fields are omitted from the payload
//! so the store fills in its column defaults.

mod case;
mod mail;
mod tracking;
mod user;

pub use case::{CASES_TABLE, CaseDraft, CaseRecord};
pub use mail::{MAILS_TABLE, MailDraft, MailEntry};
pub use tracking::{TRACKING_TABLE, TrackingDraft, TrackingSession};
pub use user::{USERS_TABLE, UserDraft, UserProfile};

use serde::{Deserialize, Deserializer};

use crate::schema::ValidationError;

/// Deserialize a nullable column into its type's default when NULL.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Blank(field))
    } else {
        Ok(())
    }
}
