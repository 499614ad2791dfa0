use thiserror::Error;

use crate::store::StoreError;
use crate::validation::ValidationErrors;

/// Tagged failures surfaced by every directory operation.
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{0}")]
    Conflict(String),
    #[error("invalid credentials")]
    Unauthorized,
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl DirectoryError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            DirectoryError::Validation(_) => 1001,
            DirectoryError::Conflict(_) => 1002,
            DirectoryError::NotFound(_) => 1003,
            DirectoryError::Unauthorized => 1004,
            DirectoryError::Forbidden(_) => 1005,
            DirectoryError::Internal(_) => 1101,
            DirectoryError::Persistence(_) => 1200,
        }
    }

    pub fn not_found(entity: &str) -> Self {
        Self::NotFound(format!("{} not found", entity))
    }

    pub fn conflict_email() -> Self {
        Self::Conflict("a business with this email already exists".into())
    }
}

impl From<ValidationErrors> for DirectoryError {
    fn from(errors: ValidationErrors) -> Self {
        DirectoryError::Validation(errors)
    }
}

impl From<StoreError> for DirectoryError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(_) => DirectoryError::conflict_email(),
            other => DirectoryError::Persistence(other.to_string()),
        }
    }
}
