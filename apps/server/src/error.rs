//! Error types for the HTTP API.
//!
//! Every failure leaves the server as `{ "code": ..., "error": ... }`.
//!
//! | Source                                | Status | code                            |
//! |---------------------------------------|--------|---------------------------------|
//! | `Validation`, malformed JSON          | 400    | `VALIDATION` / `BAD_REQUEST`    |
//! | `UnknownReference`, missing record    | 404    | `UNKNOWN_REFERENCE` / `NOT_FOUND` |
//! | `InsufficientStock`                   | 409    | `INSUFFICIENT_STOCK`            |
//! | `InsufficientStoreCredit`             | 409    | `INSUFFICIENT_STORE_CREDIT`     |
//! | `AlreadyRefundedOrNotFound`           | 409    | `ALREADY_REFUNDED_OR_NOT_FOUND` |
//! | transient storage fault               | 503    | `STORAGE_BUSY`                  |
//! | any other storage fault               | 500    | `STORAGE_FAILURE`               |
//!
//! Storage details are logged, never returned.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use aurora_core::{CoreError, ValidationError};
use aurora_db::{DbError, EngineError};

/// Wire shape of an error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub error: String,
}

/// API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Storage failure")]
    Storage(#[source] DbError),
}

impl ApiError {
    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        ApiError::NotFound(format!("{entity} not found: {id}"))
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Rejected(CoreError::Validation(_)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION")
            }
            ApiError::Rejected(CoreError::UnknownReference { .. }) => {
                (StatusCode::NOT_FOUND, "UNKNOWN_REFERENCE")
            }
            ApiError::Rejected(CoreError::InsufficientStock { .. }) => {
                (StatusCode::CONFLICT, "INSUFFICIENT_STOCK")
            }
            ApiError::Rejected(CoreError::InsufficientStoreCredit { .. }) => {
                (StatusCode::CONFLICT, "INSUFFICIENT_STORE_CREDIT")
            }
            ApiError::Rejected(CoreError::AlreadyRefundedOrNotFound { .. }) => {
                (StatusCode::CONFLICT, "ALREADY_REFUNDED_OR_NOT_FOUND")
            }
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Storage(err) if err.is_transient() => {
                (StatusCode::SERVICE_UNAVAILABLE, "STORAGE_BUSY")
            }
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_FAILURE"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        if let ApiError::Storage(err) = &self {
            error!(error = %err, code, "Request failed in storage");
        }

        let body = ErrorBody {
            code: code.to_string(),
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Rejected(reason) => ApiError::Rejected(reason),
            EngineError::Storage(db) => ApiError::from(db),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            other => ApiError::Storage(other),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::Rejected(CoreError::Validation(err))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;
