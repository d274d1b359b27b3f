//! Error types for the signaling relay.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Top-level error type for the signaling relay.
#[derive(Debug, Error)]
pub enum SrError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A client request failed schema validation.
    #[error("Rejected input: {0}")]
    RejectedInput(String),

    /// The caller's access token is missing, invalid, or expired.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The registry actor is not accepting messages (shutdown in progress).
    #[error("Registry unavailable")]
    RegistryUnavailable,

    /// Unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON error body returned to HTTP clients.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl SrError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            SrError::Config(_) | SrError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            SrError::RejectedInput(_) => StatusCode::BAD_REQUEST,
            SrError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            SrError::RegistryUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Low-cardinality label for metrics and logs.
    pub fn error_type_label(&self) -> &'static str {
        match self {
            SrError::Config(_) => "config",
            SrError::RejectedInput(_) => "rejected_input",
            SrError::Unauthorized(_) => "unauthorized",
            SrError::RegistryUnavailable => "registry_unavailable",
            SrError::Internal(_) => "internal",
        }
    }

    /// Client-safe message. Internal details stay in the logs.
    pub fn client_message(&self) -> String {
        match self {
            SrError::Config(_) | SrError::Internal(_) => "Internal server error".to_string(),
            SrError::RejectedInput(msg) => msg.clone(),
            SrError::Unauthorized(_) => "The access token is invalid or expired".to_string(),
            SrError::RegistryUnavailable => "Service temporarily unavailable".to_string(),
        }
    }
}

impl IntoResponse for SrError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(
                target: "sr.error",
                error = %self,
                error_type = self.error_type_label(),
                "Request failed"
            );
        } else {
            tracing::debug!(
                target: "sr.error",
                error = %self,
                error_type = self.error_type_label(),
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            error: self.client_message(),
        };

        (status, Json(body)).into_response()
    }
}
