//! Store and schema errors.
//!
//! Backend error types never cross the repository boundary: sqlx and reqwest
//! failures are classified into [`StoreError`] here, by SQLSTATE where the
//! backend reports one.

use funda_core::ValidationError;
use thiserror::Error;

/// Errors returned by repository and store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A UNIQUE or NOT NULL constraint rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// No row matched the key.
    #[error("not found")]
    NotFound,

    /// The table does not exist yet.
    #[error("table '{0}' does not exist")]
    MissingTable(String),

    /// A field name is not a column of the table, or may not be written.
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// Client-side validation failed before the store was called.
    #[error("invalid record: {0}")]
    Invalid(String),

    /// The store did not answer within the configured limit.
    #[error("store call timed out")]
    Timeout,

    /// Anything else the backend reported.
    #[error("store error: {0}")]
    Unknown(String),
}

impl StoreError {
    /// Classify a SQLSTATE code and message.
    #[must_use]
    pub fn from_sqlstate(code: &str, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            // unique_violation, not_null_violation, check_violation
            "23505" | "23502" | "23514" => Self::ConstraintViolation(message),
            // undefined_table; PGRST205 is the REST layer's "not in schema cache"
            "42P01" | "PGRST205" => Self::MissingTable(message),
            _ => Self::Unknown(message),
        }
    }

    /// Whether the caller should show the table setup view.
    #[must_use]
    pub const fn is_missing_table(&self) -> bool {
        matches!(self, Self::MissingTable(_))
    }
}

impl From<ValidationError> for StoreError {
    fn from(e: ValidationError) -> Self {
        Self::Invalid(e.to_string())
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => Self::NotFound,
            sqlx::Error::PoolTimedOut => Self::Timeout,
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.into_owned()).unwrap_or_default();
                Self::from_sqlstate(&code, db_err.message())
            }
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Unknown(e.to_string())
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::Unknown(format!("malformed row: {e}"))
    }
}

/// Errors returned by schema bootstrapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The store cannot run arbitrary statements; apply `statement` by hand.
    #[error("the store cannot execute schema statements remotely")]
    UnsupportedRemoteExecution { statement: String },

    /// The object being created is already present.
    #[error("already exists")]
    AlreadyExists,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SchemaError {
    /// The statement to copy, when manual application is required.
    #[must_use]
    pub fn manual_statement(&self) -> Option<&str> {
        match self {
            Self::UnsupportedRemoteExecution { statement } => Some(statement),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlstate_classification() {
        assert!(matches!(
            StoreError::from_sqlstate("23505", "duplicate key"),
            StoreError::ConstraintViolation(_)
        ));
        assert!(matches!(
            StoreError::from_sqlstate("23502", "null value"),
            StoreError::ConstraintViolation(_)
        ));
        assert!(StoreError::from_sqlstate("42P01", "relation does not exist").is_missing_table());
        assert!(StoreError::from_sqlstate("PGRST205", "not in schema cache").is_missing_table());
        assert_eq!(
            StoreError::from_sqlstate("08006", "connection failure"),
            StoreError::Unknown("connection failure".to_string())
        );
    }

    #[test]
    fn test_validation_error_becomes_invalid() {
        let err: StoreError = ValidationError::Blank("name").into();
        assert_eq!(err, StoreError::Invalid("name is required".to_string()));
    }

    #[test]
    fn test_manual_statement() {
        let err = SchemaError::UnsupportedRemoteExecution {
            statement: "CREATE TABLE".to_string(),
        };
        assert_eq!(err.manual_statement(), Some("CREATE TABLE"));
        assert_eq!(SchemaError::AlreadyExists.manual_statement(), None);
    }
}
