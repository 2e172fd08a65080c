use sea_orm::DbErr;
use thiserror::Error;

/// An error from a failed service operation
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The database rejected or failed the operation
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    /// A password could not be hashed
    #[error("password hashing failed: {0}")]
    PasswordHash(#[from] argon2::password_hash::Error),
    /// A referenced record does not exist
    #[error("{0}")]
    NotFound(String),
    /// The caller is not allowed to perform the operation
    #[error("{0}")]
    Forbidden(String),
    /// The input was rejected
    #[error("{0}")]
    Validation(String),
}

pub type Result<T, E = ServiceError> = std::result::Result<T, E>;

impl ServiceError {
    pub(crate) fn not_found(what: &str, key: impl std::fmt::Display) -> Self {
        Self::NotFound(format!("{what} {key} not found"))
    }
}
