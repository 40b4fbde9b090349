use std::fmt::Display;

use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

/// Repository-level failure, already classified so the service can translate it.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("database error: {0}")]
    Database(String),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
            return StoreError::UniqueViolation(detail);
        }
        match err {
            DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => StoreError::NotFound,
            other => StoreError::Database(other.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {message} ({cause})")]
    Internal { message: String, cause: String },
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn internal(message: &str, cause: impl Display) -> Self {
        Self::Internal { message: message.to_string(), cause: cause.to_string() }
    }

    /// Store error from a write: unique violations become conflicts, missing rows not-found.
    pub fn from_write(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::not_found("voucher"),
            StoreError::UniqueViolation(_) => Self::Conflict("voucher_code already exists".into()),
            StoreError::Database(cause) => Self::internal("database error", cause),
        }
    }

    /// Text that is safe to hand to a client. Internal causes stay in the logs.
    pub fn public_message(&self) -> &str {
        match self {
            Self::Validation(m) | Self::NotFound(m) | Self::Conflict(m) => m,
            Self::Internal { message, .. } => message,
        }
    }
}

impl From<models::errors::ModelError> for ServiceError {
    fn from(err: models::errors::ModelError) -> Self {
        Self::Validation(err.to_string())
    }
}
