//! Mailing-list entries (`mails`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::schema::{
    Column, ColumnDefault, ColumnType, Draft, Entity, Index, SortField, TableSchema,
    ValidationError,
};
use crate::types::{Email, MailId};

pub static MAILS_TABLE: TableSchema = TableSchema {
    name: "mails",
    columns: &[
        Column::id(),
        Column::new("email", ColumnType::Text).unique().not_null(),
        Column::new("first_name", ColumnType::Text),
        Column::new("last_name", ColumnType::Text),
        Column::new("phone", ColumnType::Text),
        Column::new("subscribed", ColumnType::Boolean).with_default(ColumnDefault::Bool(true)),
        Column::new("source", ColumnType::Text).with_default(ColumnDefault::Text("manual")),
        Column::new("tags", ColumnType::TextArray),
        Column::new("notes", ColumnType::Text),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
    indexes: &[
        Index {
            name: "idx_mails_email",
            column: "email",
        },
        Index {
            name: "idx_mails_subscribed",
            column: "subscribed",
        },
    ],
    searchable: &["email", "first_name", "last_name"],
    filterable: &["subscribed", "source"],
    update_key: "email",
    updatable: &[
        "first_name",
        "last_name",
        "phone",
        "subscribed",
        "source",
        "tags",
        "notes",
    ],
    default_order: SortField::NEWEST_FIRST,
    filter_order: SortField::NEWEST_FIRST,
};

/// A mailing-list subscriber, unique by email.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailEntry {
    pub id: MailId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub subscribed: bool,
    pub source: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MailEntry {
    /// "First Last", or the email when no name is on file.
    #[must_use]
    pub fn display_name(&self) -> String {
        let name = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if name.is_empty() {
            self.email.clone()
        } else {
            name
        }
    }
}

impl Entity for MailEntry {
    type Draft = MailDraft;

    fn schema() -> &'static TableSchema {
        &MAILS_TABLE
    }
}

/// Insert payload for a mailing-list entry.
///
/// `subscribed` defaults to true and `source` to `"manual"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailDraft {
    #[serde(serialize_with = "crate::types::serialize_canonical")]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscribed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl MailDraft {
    #[must_use]
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }
}

impl Draft for MailDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        Email::parse(&self.email)?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::EmailError;

    #[test]
    fn test_email_is_stored_canonical() {
        let draft = MailDraft::new("  Ana@FUNDA.MX ");
        assert!(draft.validate().is_ok());
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["email"], "Ana@funda.mx");
    }

    #[test]
    fn test_validate_email() {
        assert!(MailDraft::new("juan.perez@gmail.com").validate().is_ok());
        assert_eq!(
            MailDraft::new("juan.perez").validate(),
            Err(ValidationError::Email(EmailError::MissingAtSymbol))
        );
        assert_eq!(
            MailDraft::new("").validate(),
            Err(ValidationError::Email(EmailError::Empty))
        );
    }

    #[test]
    fn test_display_name() {
        let row = serde_json::json!({
            "id": "6f1c2a9e-3b1d-4c55-9a51-0b0f5c3d2e11",
            "email": "carlos.martinez@yahoo.com",
            "first_name": "Carlos",
            "last_name": null,
            "subscribed": null,
            "created_at": "2025-01-10T12:00:00Z",
            "updated_at": "2025-01-10T12:00:00Z"
        });
        let mut entry: MailEntry = serde_json::from_value(row).unwrap();
        assert_eq!(entry.display_name(), "Carlos");
        assert!(!entry.subscribed);

        entry.first_name = None;
        assert_eq!(entry.display_name(), "carlos.martinez@yahoo.com");
    }
}
