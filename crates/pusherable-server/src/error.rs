//! Error handling for the REST API server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::fmt;

/// API error type.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: String,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    // Common error constructors
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR", message)
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "CONFIGURATION_ERROR",
            message,
        )
    }

    pub fn publish_failed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "PUBLISH_FAILED", message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.status, self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code,
                message: self.message,
                details: self.details,
            },
        };

        (self.status, Json(body)).into_response()
    }
}

// Convert from pusherable-core errors
impl From<pusherable_core::PusherableError> for ApiError {
    fn from(err: pusherable_core::PusherableError) -> Self {
        use pusherable_core::{ErrorCode, PusherableError};

        let code = err.code().map(|c| c.as_str());
        let api_error = match &err {
            PusherableError::Configuration { message, .. } => ApiError::configuration(message.clone()),
            // Local serialization of the model, nothing was sent
            PusherableError::Validation {
                code: ErrorCode::ValMissingField | ErrorCode::ValNotAnObject,
                ..
            } => ApiError::configuration(err.to_string()),
            PusherableError::Validation { .. }
            | PusherableError::Authentication { .. }
            | PusherableError::Network { .. } => ApiError::publish_failed(err.to_string()),
            PusherableError::Io(_) | PusherableError::Serialization(_) => {
                ApiError::internal(err.to_string())
            }
        };

        match code {
            Some(code) => api_error.with_details(serde_json::json!({ "reason": code })),
            None => api_error,
        }
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
