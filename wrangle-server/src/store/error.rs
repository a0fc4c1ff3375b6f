//! Storage error type shared by all backends

use mongodb::error::{ErrorKind, WriteFailure};
use thiserror::Error;
use wrangle_core::ValidationError;

pub type StoreResult<T> = Result<T, StoreError>;

/// MongoDB server code for a duplicate key on a unique index
pub(crate) const MONGO_DUPLICATE_KEY: i32 = 11000;

/// MongoDB server code returned by `create` for an existing collection
pub(crate) const MONGO_NAMESPACE_EXISTS: i32 = 48;

/// Database error type
#[derive(Debug, Error)]
pub enum StoreError {
    /// Input the store refused or that failed validation before reaching it
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{resource} '{id}' not found")]
    NotFound { resource: &'static str, id: String },

    /// Unique constraint hit (account name, contact email)
    #[error("{0}")]
    Duplicate(String),

    /// Connection could not be established or was lost
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            id: id.into(),
        }
    }
}

/// SQLSTATE codes that mean "your input does not fit this table"
fn is_data_error(code: &str) -> bool {
    code.starts_with("22") || matches!(code, "23502" | "23514" | "42703" | "42804")
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db) => {
                let message = db.message().to_owned();
                match db.code().as_deref() {
                    Some("23505") => Self::Duplicate(message),
                    Some(code) if is_data_error(code) => {
                        Self::Validation(ValidationError::Rejected { reason: message })
                    }
                    _ => Self::Backend(message),
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Unavailable(err.to_string()),
            _ => Self::Backend(err.to_string()),
        }
    }
}

/// Server error code carried by a MongoDB error, if any.
pub(crate) fn mongo_error_code(err: &mongodb::error::Error) -> Option<i32> {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(e)) => Some(e.code),
        ErrorKind::Command(e) => Some(e.code),
        _ => None,
    }
}

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        if mongo_error_code(&err) == Some(MONGO_DUPLICATE_KEY) {
            return Self::Duplicate(err.to_string());
        }
        match err.kind.as_ref() {
            ErrorKind::ServerSelection { .. } | ErrorKind::Io(_) => {
                Self::Unavailable(err.to_string())
            }
            _ => Self::Backend(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = StoreError::not_found("contact", "7");
        assert_eq!(err.to_string(), "contact '7' not found");
    }

    #[test]
    fn pool_timeout_is_unavailable() {
        let err = StoreError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn row_not_found_is_backend() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Backend(_)));
    }

    #[test]
    fn data_error_codes() {
        assert!(is_data_error("22P02"));
        assert!(is_data_error("42703"));
        assert!(!is_data_error("23505"));
        assert!(!is_data_error("42P01"));
    }
}
