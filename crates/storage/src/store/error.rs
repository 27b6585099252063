#![forbid(unsafe_code)]

use super::pool::PoolError;
use rusqlite::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("sqlite: {0}")]
    Sql(rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse classification used by callers to map failures onto status codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    ConstraintViolation,
    Validation,
    StorageUnavailable,
    Internal,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::ConstraintViolation => "constraint_violation",
            Self::Validation => "validation",
            Self::StorageUnavailable => "storage_unavailable",
            Self::Internal => "internal",
        }
    }
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            Self::Validation(_) => ErrorKind::Validation,
            Self::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Self::Sql(_) | Self::Io(_) | Self::Json(_) => ErrorKind::Internal,
        }
    }

    pub(in crate::store) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(in crate::store) fn invalid(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(code, message) => match code.code {
                ErrorCode::ConstraintViolation => Self::ConstraintViolation(
                    message.clone().unwrap_or_else(|| code.to_string()),
                ),
                ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked
                | ErrorCode::CannotOpen
                | ErrorCode::SystemIoFailure
                | ErrorCode::DiskFull => Self::StorageUnavailable(
                    message.clone().unwrap_or_else(|| code.to_string()),
                ),
                _ => Self::Sql(value),
            },
            _ => Self::Sql(value),
        }
    }
}

impl From<PoolError> for StoreError {
    fn from(value: PoolError) -> Self {
        match value {
            PoolError::InvalidConfig(message) => Self::Validation(message),
            other => Self::StorageUnavailable(other.to_string()),
        }
    }
}
