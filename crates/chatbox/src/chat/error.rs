//! Chat storage and service error types.

use thiserror::Error;

use crate::genai::GenAiError;

/// Result type for repository operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by [`super::ChatRepository`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// The targeted row does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// A uniqueness constraint rejected the write.
    #[error("{0} already exists")]
    Conflict(String),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Map a write error, turning unique violations into [`StoreError::Conflict`].
    pub(crate) fn from_write(err: sqlx::Error, what: &str) -> Self {
        let unique_violation =
            matches!(&err, sqlx::Error::Database(db_err) if db_err.is_unique_violation());
        if unique_violation {
            Self::Conflict(what.to_string())
        } else {
            Self::Database(err)
        }
    }
}

/// Errors raised by [`super::ChatService`].
#[derive(Debug, Error)]
pub enum ChatError {
    /// Missing or malformed input.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    GenAi(#[from] GenAiError),
}
