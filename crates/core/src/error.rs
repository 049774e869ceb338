/// Errors surfaced by every core operation.
///
/// `NotFound` covers both "absent" and "not visible to this caller".
#[derive(Debug, thiserror::Error)]
pub enum CareError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("record not found")]
    NotFound,
    #[error("operation not permitted")]
    Forbidden,
    #[error("authentication required")]
    Unauthenticated,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("database connection lock poisoned")]
    StorePoisoned,
    #[error("failed to hash password: {0}")]
    PasswordHash(String),
}

impl CareError {
    /// Builds a `Validation` error naming the offending field.
    pub fn field(field: &str, message: impl std::fmt::Display) -> Self {
        CareError::Validation(format!("{field}: {message}"))
    }
}

pub type CareResult<T> = std::result::Result<T, CareError>;
