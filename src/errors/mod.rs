//! Error handling module for the catalog admin backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::jobs::CollaboratorError;
use crate::store::StoreError;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const CONFLICT: &str = "CONFLICT";
    pub const JOB_IN_PROGRESS: &str = "JOB_IN_PROGRESS";
    pub const COLLECTOR_FAILED: &str = "COLLECTOR_FAILED";
    pub const DECODE_FAILED: &str = "DECODE_FAILED";
    pub const ALLOCATION_PARSE: &str = "ALLOCATION_PARSE";
    pub const STORE_UNAVAILABLE: &str = "STORE_UNAVAILABLE";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Application error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    /// Authentication required
    Unauthorized(String),
    /// Another collection job holds the job slot
    JobInProgress,
    /// The external collaborator failed after admission
    CollectorFailed { cause: String },
    /// Stale revision or duplicate id on write
    Conflict(String),
    /// Referenced document is absent
    NotFound(String),
    /// Stored payload does not match the category shape
    DecodeFailed(String),
    /// Current maximum id is not an integer
    AllocationParse(String),
    /// Transport or connectivity failure talking to the store
    StoreUnavailable(String),
    /// Validation error
    Validation(String),
    /// Internal server error
    Internal(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::JobInProgress => StatusCode::TOO_MANY_REQUESTS,
            AppError::CollectorFailed { .. } => StatusCode::BAD_GATEWAY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DecodeFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::AllocationParse(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::JobInProgress => codes::JOB_IN_PROGRESS,
            AppError::CollectorFailed { .. } => codes::COLLECTOR_FAILED,
            AppError::Conflict(_) => codes::CONFLICT,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::DecodeFailed(_) => codes::DECODE_FAILED,
            AppError::AllocationParse(_) => codes::ALLOCATION_PARSE,
            AppError::StoreUnavailable(_) => codes::STORE_UNAVAILABLE,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::JobInProgress => "Collection job in progress".to_string(),
            AppError::CollectorFailed { cause } => format!("Collector failed: {}", cause),
            AppError::Unauthorized(msg)
            | AppError::Conflict(msg)
            | AppError::NotFound(msg)
            | AppError::DecodeFailed(msg)
            | AppError::AllocationParse(msg)
            | AppError::StoreUnavailable(msg)
            | AppError::Validation(msg)
            | AppError::Internal(msg)
            | AppError::BadRequest(msg) => msg.clone(),
        }
    }

    /// Map a store failure for a specific document id.
    pub fn from_store(err: StoreError, id: &str) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound(format!("Category {} not found", id)),
            StoreError::Conflict => AppError::Conflict(format!(
                "Category {} was modified concurrently or already exists",
                id
            )),
            other => other.into(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Document not found".to_string()),
            StoreError::Conflict => AppError::Conflict("Document revision conflict".to_string()),
            StoreError::Unavailable(msg) => {
                tracing::error!("Store unavailable: {}", msg);
                AppError::StoreUnavailable(format!("Store unavailable: {}", msg))
            }
            StoreError::Malformed(msg) => {
                tracing::error!("Malformed store response: {}", msg);
                AppError::DecodeFailed(format!("Malformed store response: {}", msg))
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<CollaboratorError> for AppError {
    fn from(err: CollaboratorError) -> Self {
        tracing::error!("Collaborator error: {}", err);
        AppError::CollectorFailed {
            cause: err.to_string(),
        }
    }
}

/// Error details in the response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetails,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        let details = match error {
            AppError::Conflict(_) => Some(serde_json::json!({ "retry": "refetch" })),
            AppError::JobInProgress => Some(serde_json::json!({ "retry": "later" })),
            _ => None,
        };

        Self {
            success: false,
            error: ErrorDetails {
                code: error.error_code().to_string(),
                message: error.message(),
                details,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorResponse::new(&self);
        (status, Json(body)).into_response()
    }
}
