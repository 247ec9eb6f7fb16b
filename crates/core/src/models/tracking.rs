//! Visitor tracking sessions (`users_tracking`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{null_as_default, require};
use crate::schema::{
    Column, ColumnDefault, ColumnType, Draft, Entity, Index, SortField, TableSchema,
    ValidationError,
};
use crate::types::{DeviceType, TrackingId};

pub static TRACKING_TABLE: TableSchema = TableSchema {
    name: "users_tracking",
    columns: &[
        Column::id(),
        Column::new("email", ColumnType::Text),
        Column::new("first_name", ColumnType::Text),
        Column::new("last_name", ColumnType::Text),
        Column::new("phone", ColumnType::Text),
        Column::new("session_id", ColumnType::Text).unique().not_null(),
        Column::new("user_agent", ColumnType::Text),
        Column::new("ip_address", ColumnType::Text),
        Column::new("referrer", ColumnType::Text),
        Column::new("landing_page", ColumnType::Text),
        Column::new("current_page", ColumnType::Text),
        Column::new("visit_count", ColumnType::Integer).with_default(ColumnDefault::Int(1)),
        Column::timestamp("last_visit"),
        Column::new("country", ColumnType::Text),
        Column::new("city", ColumnType::Text),
        Column::new("device_type", ColumnType::Text),
        Column::timestamp("created_at"),
        Column::timestamp("updated_at"),
    ],
    indexes: &[
        Index {
            name: "idx_users_tracking_session_id",
            column: "session_id",
        },
        Index {
            name: "idx_users_tracking_email",
            column: "email",
        },
        Index {
            name: "idx_users_tracking_created_at",
            column: "created_at",
        },
    ],
    searchable: &["email", "first_name", "last_name", "session_id"],
    filterable: &["device_type", "country"],
    update_key: "session_id",
    updatable: &[
        "email",
        "first_name",
        "last_name",
        "phone",
        "user_agent",
        "ip_address",
        "referrer",
        "current_page",
        "visit_count",
        "last_visit",
        "country",
        "city",
        "device_type",
    ],
    default_order: SortField::NEWEST_FIRST,
    filter_order: SortField::NEWEST_FIRST,
};

/// One browser session on the storefront, anonymous until an email is known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingSession {
    pub id: TrackingId,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub session_id: String,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub referrer: Option<String>,
    pub landing_page: Option<String>,
    pub current_page: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub visit_count: i32,
    pub last_visit: Option<DateTime<Utc>>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub device_type: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TrackingSession {
    /// Whether the visitor has identified themselves.
    #[must_use]
    pub fn is_identified(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    /// Visitor name, or "Anonymous".
    #[must_use]
    pub fn visitor(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(name), None) | (None, Some(name)) => name.to_string(),
            (None, None) => "Anonymous".to_string(),
        }
    }
}

impl Entity for TrackingSession {
    type Draft = TrackingDraft;

    fn schema() -> &'static TableSchema {
        &TRACKING_TABLE
    }
}

/// Insert payload for a tracking session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingDraft {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub landing_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visit_count: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
}

impl TrackingDraft {
    #[must_use]
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            ..Self::default()
        }
    }

    /// First page view of a new session: landing and current page are the same.
    #[must_use]
    pub fn landing(
        session_id: impl Into<String>,
        page: impl Into<String>,
        user_agent: Option<String>,
        referrer: Option<String>,
    ) -> Self {
        let page = page.into();
        let device_type = user_agent
            .as_deref()
            .map(|ua| DeviceType::from_user_agent(ua).as_str().to_string());
        Self {
            session_id: session_id.into(),
            landing_page: Some(page.clone()),
            current_page: Some(page),
            user_agent,
            referrer,
            device_type,
            ..Self::default()
        }
    }
}

impl Draft for TrackingDraft {
    fn validate(&self) -> Result<(), ValidationError> {
        require("session_id", &self.session_id)?;
        if self.visit_count.is_some_and(|n| n < 1) {
            return Err(ValidationError::BelowMinimum {
                field: "visit_count",
                min: 1,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        assert!(TrackingDraft::new("sess_001_ana").validate().is_ok());
        assert_eq!(
            TrackingDraft::new("").validate(),
            Err(ValidationError::Blank("session_id"))
        );

        let mut draft = TrackingDraft::new("sess_002_anon");
        draft.visit_count = Some(0);
        assert_eq!(
            draft.validate(),
            Err(ValidationError::BelowMinimum {
                field: "visit_count",
                min: 1
            })
        );
    }

    #[test]
    fn test_landing_derives_device() {
        let draft = TrackingDraft::landing(
            "abc",
            "/",
            Some("Mozilla/5.0 (Android 13; Mobile) Chrome/120.0.0.0".to_string()),
            None,
        );
        assert_eq!(draft.device_type.as_deref(), Some("mobile"));
        assert_eq!(draft.landing_page, draft.current_page);
        assert!(draft.visit_count.is_none());
    }

    #[test]
    fn test_visitor_name() {
        let row = serde_json::json!({
            "id": "6f1c2a9e-3b1d-4c55-9a51-0b0f5c3d2e11",
            "session_id": "sess_002_anon",
            "visit_count": 1,
            "created_at": "2025-01-10T12:00:00Z",
            "updated_at": "2025-01-10T12:00:00Z"
        });
        let session: TrackingSession = serde_json::from_value(row).unwrap();
        assert_eq!(session.visitor(), "Anonymous");
        assert!(!session.is_identified());
        assert!(session.last_visit.is_none());
    }
}
