use serde::Serialize;
use thiserror::Error;

/// Error taxonomy for the rebate core.
///
/// Only hard failures appear here. Integrity gaps during hydration and
/// incomplete amount calculations are absorbed as `tracing::warn!` events and
/// never interrupt an operation in progress.
#[derive(Debug, Clone, Error, Serialize)]
pub enum ServiceError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(errors.to_string())
    }
}
