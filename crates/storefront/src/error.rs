//! Unified error handling with Sentry integration.
//!
//! Server errors are captured to Sentry before responding; clients only see
//! a generic message for them.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use funda_store::StoreError;
use thiserror::Error;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound) | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            Self::Store(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Session(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Something went wrong, please try again".to_string()
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Add a Sentry breadcrumb for a visitor action.
///
/// Breadcrumbs show the trail of actions leading up to a captured error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::from(StoreError::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::from(StoreError::Timeout).status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            AppError::from(StoreError::MissingTable("fundas".into())).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::BadRequest("quantity".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let response = AppError::from(StoreError::Unknown("password=hunter2".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
