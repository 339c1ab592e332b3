//! Standardized error handling for API responses
//!
//! Every handler error becomes the same JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

/// Standard API error response format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status code
    pub status: u16,

    /// Error code for programmatic handling
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional detailed error information
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,

    /// Timestamp when error occurred
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(status: u16, error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            message: message.into(),
            details: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// API error types with standardized responses
#[derive(Debug)]
pub enum ApiError {
    /// 500 Internal Server Error
    Internal(String),

    /// 404 Not Found
    NotFound(String),

    /// 401 Unauthorized
    AuthenticationFailed,

    /// 403 Forbidden
    Forbidden(String),

    /// 409 Conflict
    Conflict(String),

    /// 422 Unprocessable Entity
    ValidationError(String),

    /// 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Convert error to ErrorResponse
    pub fn to_error_response(&self) -> ErrorResponse {
        match self {
            ApiError::Internal(msg) => {
                error!("Internal API error: {}", msg);
                ErrorResponse::new(
                    500,
                    "INTERNAL_ERROR",
                    "An internal server error occurred",
                )
                .with_details(msg)
            }
            ApiError::NotFound(msg) => {
                ErrorResponse::new(404, "NOT_FOUND", msg)
            }
            ApiError::AuthenticationFailed => {
                ErrorResponse::new(
                    401,
                    "AUTHENTICATION_FAILED",
                    "Authentication credentials are invalid or missing",
                )
            }
            ApiError::Forbidden(msg) => {
                ErrorResponse::new(403, "FORBIDDEN", msg)
            }
            ApiError::Conflict(msg) => {
                ErrorResponse::new(409, "CONFLICT", msg)
            }
            ApiError::ValidationError(msg) => {
                ErrorResponse::new(422, "VALIDATION_ERROR", msg)
            }
            ApiError::ServiceUnavailable(msg) => {
                ErrorResponse::new(503, "SERVICE_UNAVAILABLE", msg)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let error_response = self.to_error_response();
        let status_code = StatusCode::from_u16(error_response.status)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        (status_code, Json(error_response)).into_response()
    }
}

impl ApiError {
    pub fn permission_denied(action: impl std::fmt::Display, resource: impl Into<String>) -> Self {
        ApiError::Forbidden(format!("Not allowed to {} {}", action, resource.into()))
    }

    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ApiError::ValidationError(format!("{}: {}", field.into(), reason.into()))
    }
}
