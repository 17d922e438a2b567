//! Unified error handling for the API.
//!
//! Every error leaving a handler is an [`ApiError`]; its `IntoResponse`
//! implementation produces the status code plus a `{ "message": ... }` JSON
//! body the dashboard displays verbatim.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use sante_core::CoreError;
use sante_db::service::ServiceError;
use sante_db::DbError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Bad request: validation failure or business rule violation.
    #[error("{0}")]
    BadRequest(String),

    /// Internal server error. The detail is logged, never sent to clients.
    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match &err {
            CoreError::MedicationNotFound(_)
            | CoreError::PrescriptionNotFound(_)
            | CoreError::ProcurementNotFound(_)
            | CoreError::TreatmentNotFound(_) => ApiError::NotFound(err.to_string()),

            CoreError::DuplicatePrescription { .. }
            | CoreError::InsufficientStock { .. }
            | CoreError::EmptyLineItems
            | CoreError::InvalidQuantity { .. }
            | CoreError::Validation(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match &err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Core(core) => core.into(),
            ServiceError::Db(db) => db.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(detail) = &self {
            tracing::error!(error = %detail, "API request failed");
        }

        let status = self.status();
        let message = match &self {
            // Don't expose internal error details to clients
            ApiError::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
