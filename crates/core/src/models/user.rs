//! Registered user profiles (`users`).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{null_as_default, require};
use crate::schema::{
    Column, ColumnDefault, ColumnType, Draft, Entity, Index, SortField, TableSchema,
    ValidationError,
};
use crate::types::{Email, UserId};

pub static USERS_TABLE: TableSchema = TableSchema {
    name: "users",
    columns: &[
        Column::id(),
        Column::new("email", ColumnType::Text).unique().not_null(),
        Column::new("first_name", ColumnType::Text).not_null(),
        Column::new("last_name", ColumnType::Text).not_null(),
        Column::new("phone", ColumnType::Text),
        Column::new("address", ColumnType::Text),
        Column::new("city", ColumnType::Text),
        Column::new("country", ColumnType::Text),
        Column::new("postal_code", ColumnType::Text),
        Column::new("date_of_birth", ColumnType::Date),
        Column::new("newsletter_subscribed", ColumnType::Boolean)
            .with_default(ColumnDefault::Bool(false)),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
    indexes: &[
        Index {
            name: "idx_users_email",
            column: "email",
        },
        Index {
            name: "idx_users_country",
            column: "country",
        },
    ],
    searchable: &["email", "first_name", "last_name", "phone"],
    filterable: &["country", "city"],
    update_key: "id",
    updatable: &[
        "first_name",
        "last_name",
        "phone",
        "address",
        "city",
        "country",
        "postal_code",
        "date_of_birth",
        "newsletter_subscribed",
    ],
    default_order: SortField::NEWEST_FIRST,
    filter_order: SortField::NEWEST_FIRST,
};

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub newsletter_subscribed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// "City, Country" with whichever parts are known.
    #[must_use]
    pub fn location(&self) -> String {
        [self.city.as_deref(), self.country.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Entity for UserProfile {
    type Draft = UserDraft;

    fn schema() -> &'static TableSchema {
        &USERS_TABLE
    }
}

/// Insert payload for a user profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    #[serde(serialize_with = "crate::types::serialize_canonical")]
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newsletter_subscribed: Option<bool>,
}

impl UserDraft {
    #[must_use]
    pub fn new(
        email: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Self::default()
        }
    }
}

impl Draft for UserDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        Email::parse(&self.email)?;
        require("first_name", &self.first_name)?;
        require("last_name", &self.last_name)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_email_is_stored_canonical() {
        let draft = UserDraft::new("  Ana@FUNDA.MX ", "Ana", "López");
        assert!(draft.validate().is_ok());
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["email"], "Ana@funda.mx");
    }

    #[test]
    fn test_validate() {
        assert!(
            UserDraft::new("maria.gonzalez@gmail.com", "María", "González")
                .validate()
                .is_ok()
        );
        assert_eq!(
            UserDraft::new("maria.gonzalez@gmail.com", "María", " ").validate(),
            Err(ValidationError::Blank("last_name"))
        );
        assert!(matches!(
            UserDraft::new("maria", "María", "González").validate(),
            Err(ValidationError::Email(_))
        ));
    }

    #[test]
    fn test_date_of_birth_serializes_as_date() {
        let mut draft = UserDraft::new("a@b.mx", "Ana", "Martínez");
        draft.date_of_birth = NaiveDate::from_ymd_opt(1992, 3, 10);
        let json = serde_json::to_value(&draft).unwrap();
        assert_eq!(json["date_of_birth"], "1992-03-10");
    }

    #[test]
    fn test_location() {
        let row = serde_json::json!({
            "id": "6f1c2a9e-3b1d-4c55-9a51-0b0f5c3d2e11",
            "email": "luis.hernandez@outlook.com",
            "first_name": "Luis",
            "last_name": "Hernández",
            "city": "Puebla",
            "country": "México",
            "created_at": "2025-01-10T12:00:00Z",
            "updated_at": "2025-01-10T12:00:00Z"
        });
        let user: UserProfile = serde_json::from_value(row).unwrap();
        assert_eq!(user.location(), "Puebla, México");
        assert_eq!(user.full_name(), "Luis Hernández");
        assert!(!user.newsletter_subscribed);
    }
}
