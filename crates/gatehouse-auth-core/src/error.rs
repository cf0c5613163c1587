//! Auth errors

use gatehouse_db::DbError;
use thiserror::Error;

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed input, rejected before any mutation
    #[error("validation failed: {0}")]
    Validation(String),

    /// Accessor called before the prerequisite state was populated.
    /// Programmer error: unreachable in a correct call sequence.
    #[error("authentication state not populated: {0}")]
    State(&'static str),

    /// The underlying store failed; the operation was aborted with no
    /// assumption of partial success
    #[error("storage error: {0}")]
    Storage(DbError),

    /// Internal error (inconsistent store contents, transport setup, config)
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<DbError> for AuthError {
    fn from(err: DbError) -> Self {
        tracing::error!("storage error: {}", err);
        Self::Storage(err)
    }
}
