//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use funda_store::StoreError;
use thiserror::Error;

use crate::screen::ScreenError;

/// Application-level error type for the admin screens.
#[derive(Debug, Error)]
pub enum AppError {
    /// Store operation failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Another mutation is already running on this screen.
    #[error("Another operation is in progress")]
    Busy,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<ScreenError> for AppError {
    fn from(err: ScreenError) -> Self {
        match err {
            ScreenError::Busy => Self::Busy,
            ScreenError::Store(e) => Self::Store(e),
        }
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            Self::Store(
                StoreError::Invalid(_) | StoreError::UnknownField(_) | StoreError::ConstraintViolation(_),
            ) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(StoreError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            Self::Store(_) => StatusCode::BAD_GATEWAY,
            Self::Busy => StatusCode::CONFLICT,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Store(StoreError::Unknown(_)) => "Store error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}
