//! Storage-specific error types.
//!
//! All storage operations return [`StoreError`] on failure, split into
//! "cannot reach the store right now" and "this row can never be written or
//! read".

use sqlx::error::ErrorKind;
use thiserror::Error;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database unreachable, locked, closed, or the writer actor is gone.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Constraint violation or a row that cannot be encoded/decoded.
    #[error("invalid data: {0}")]
    Invalid(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => match db_err.kind() {
                ErrorKind::UniqueViolation
                | ErrorKind::ForeignKeyViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation => Self::Invalid(err.to_string()),
                _ => Self::Unavailable(err.to_string()),
            },
            sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::Decode(_)
            | sqlx::Error::TypeNotFound { .. }
            | sqlx::Error::RowNotFound => Self::Invalid(err.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}
