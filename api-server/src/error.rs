//! Error handling for the HTTP layer

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::error::Error;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub error: String,
    /// Error code (string identifier for the error type)
    pub code: String,
    /// Request ID for tracing
    pub request_id: String,
}

/// API errors
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Common(#[from] Error),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    /// Status and stable code for this error
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Common(e) => match e {
                // Client errors (4xx)
                Error::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_error"),
                Error::SameAccountTransfer(_) => (StatusCode::BAD_REQUEST, "same_account"),
                Error::NonPositiveAmount(_) => (StatusCode::BAD_REQUEST, "non_positive_amount"),
                Error::InsufficientBalance(_) => (StatusCode::BAD_REQUEST, "insufficient_balance"),
                Error::AccountNotFound(_) => (StatusCode::NOT_FOUND, "account_not_found"),
                Error::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
                Error::AuthenticationError(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),

                // Server errors (5xx)
                Error::Timeout(_) => (StatusCode::SERVICE_UNAVAILABLE, "timeout"),
                Error::ConfigurationError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error"),
                Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
                Error::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
                Error::Serialization(_) => (StatusCode::INTERNAL_SERVER_ERROR, "serialization_error"),
                Error::DecimalError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "decimal_error"),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Generate a request ID for tracking errors
        let request_id = Uuid::new_v4().to_string();
        let (status, code) = self.status_and_code();

        // Storage and internal details stay in the log
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("API Error [{}]: {:?}", request_id, &self);
            "internal server error".to_string()
        } else {
            tracing::warn!("API Error [{}]: {}", request_id, &self);
            self.to_string()
        };

        let error_response = ErrorResponse {
            error: message,
            code: code.to_string(),
            request_id,
        };

        (status, Json(error_response)).into_response()
    }
}
