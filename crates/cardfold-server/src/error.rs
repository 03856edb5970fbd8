//! Error handling for the HTTP server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use cardfold_core::error::CardfoldError;
use serde::Serialize;
use serde_json::json;
use std::fmt;
use tracing::error;

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
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message)
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
        if self.status.is_server_error() {
            error!(code = %self.code, message = %self.message, "Request failed");
        }

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

// Convert from cardfold-core errors
impl From<CardfoldError> for ApiError {
    fn from(err: CardfoldError) -> Self {
        let code = err.code();
        let details = json!({
            "error_code": code.as_str(),
            "suggestion": err.suggestion(),
        });

        let api_error = match err {
            CardfoldError::Validation { message, .. } => ApiError::bad_request(message),
            CardfoldError::NotFound { message, .. } => ApiError::not_found(message),
            CardfoldError::Configuration(msg) => ApiError::internal(msg),
            CardfoldError::UnsupportedProvider { provider } => {
                ApiError::internal(format!("Unsupported provider: {}", provider))
            }
            CardfoldError::Embedding { message, .. } => {
                ApiError::bad_gateway(format!("Embedding error: {}", message))
            }
            CardfoldError::Llm { message, .. } => {
                ApiError::bad_gateway(format!("LLM error: {}", message))
            }
            CardfoldError::Database { message, .. } => {
                ApiError::internal(format!("Database error: {}", message))
            }
            CardfoldError::Parse { message, .. } => {
                ApiError::internal(format!("Parse error: {}", message))
            }
            CardfoldError::Serialization(e) => {
                ApiError::internal(format!("Serialization error: {}", e))
            }
            CardfoldError::Io(e) => ApiError::internal(format!("IO error: {}", e)),
            CardfoldError::Internal(msg) => ApiError::internal(msg),
        };

        api_error.with_details(details)
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_id_maps_to_bad_request() {
        let err: ApiError = CardfoldError::invalid_id("flashcard", "abc").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "BAD_REQUEST");
        assert_eq!(err.details.unwrap()["error_code"], "VAL_002");
    }

    #[test]
    fn test_missing_field_maps_to_bad_request() {
        let err: ApiError = CardfoldError::missing_field("flashcard_id").into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        let details = err.details.unwrap();
        assert_eq!(details["error_code"], "VAL_001");
        assert!(details["suggestion"].is_string());
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err: ApiError = CardfoldError::card_not_found(7).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert!(err.message.contains('7'));
    }

    #[test]
    fn test_database_maps_to_500() {
        let err: ApiError = CardfoldError::database("disk full").into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.details.unwrap()["error_code"], "DB_002");
    }
}
