use thiserror::Error;

/// Failures raised by the user directory
///
/// Anything coming out of the database is a persistence failure and is
/// propagated to the caller untouched; there are no retries at this layer.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Email already registered")]
    EmailAlreadyExists,

    #[error("User not found")]
    NotFound,

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Result type for user directory operations
pub type UserResult<T> = Result<T, UserError>;
