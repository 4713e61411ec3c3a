//! Error handling module for the Mini App backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::auth::LaunchDataError;
use crate::store::StoreError;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const INVALID_SIGNATURE: &str = "INVALID_SIGNATURE";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const UPSTREAM_UNAVAILABLE: &str = "UPSTREAM_UNAVAILABLE";
    pub const VERSION_MISMATCH: &str = "VERSION_MISMATCH";
    pub const PRECONDITION_REQUIRED: &str = "PRECONDITION_REQUIRED";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Launch data failed verification
    InvalidSignature(String),
    /// Caller lacks the privilege for this operation
    Forbidden(String),
    /// Document store unreachable or unhappy
    Upstream(String),
    /// Conditional write against a stale revision
    Conflict {
        message: String,
        current_revision: String,
    },
    /// Conditional write required but no revision supplied
    PreconditionRequired(String),
    /// Bad request
    BadRequest(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidSignature(_) => StatusCode::FORBIDDEN,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::PreconditionRequired(_) => StatusCode::PRECONDITION_REQUIRED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidSignature(_) => codes::INVALID_SIGNATURE,
            AppError::Forbidden(_) => codes::FORBIDDEN,
            AppError::Upstream(_) => codes::UPSTREAM_UNAVAILABLE,
            AppError::Conflict { .. } => codes::VERSION_MISMATCH,
            AppError::PreconditionRequired(_) => codes::PRECONDITION_REQUIRED,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::InvalidSignature(msg) => msg.clone(),
            AppError::Forbidden(msg) => msg.clone(),
            AppError::Upstream(msg) => msg.clone(),
            AppError::Conflict { message, .. } => message.clone(),
            AppError::PreconditionRequired(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<LaunchDataError> for AppError {
    fn from(err: LaunchDataError) -> Self {
        tracing::warn!("Rejected launch data: {}", err);
        // The reason stays in the log; callers only learn the signature was refused.
        AppError::InvalidSignature("Invalid signature".to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Document store error: {:?}", err);
        AppError::Upstream("Document store is unavailable".to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::debug!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
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
            AppError::Conflict {
                current_revision, ..
            } => Some(serde_json::json!({ "currentRevision": current_revision })),
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
