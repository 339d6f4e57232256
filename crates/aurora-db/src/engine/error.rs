//! Engine error type.

use thiserror::Error;

use crate::error::DbError;
use aurora_core::{CoreError, ValidationError};

/// Why a checkout or refund did not commit.
///
/// Either way nothing was written.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule said no. The caller can fix the request and resubmit.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// The store failed. Surfaced opaquely; retrying is the caller's call.
    #[error("Storage failure: {0}")]
    Storage(#[from] DbError),
}

impl EngineError {
    /// Returns the domain rejection, if this is one.
    pub fn rejection(&self) -> Option<&CoreError> {
        match self {
            EngineError::Rejected(err) => Some(err),
            EngineError::Storage(_) => None,
        }
    }
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Rejected(CoreError::Validation(err))
    }
}

impl From<sqlx::Error> for EngineError {
    fn from(err: sqlx::Error) -> Self {
        EngineError::Storage(DbError::from(err))
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
