//! Error types for the REST API.

use crate::ledger::LedgerError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;


/// API error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
    /// Error code.
    pub code: String,
}

/// API error types.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Invalid request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Quote resolution failed.
    #[error(transparent)]
    Quote(#[from] quote_client::Error),

    /// Ledger persistence failed.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// Internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status and machine-readable code for this error.
    ///
    /// Missing data and bad symbols are the caller's problem (4xx); provider
    /// failures are reported as a bad gateway with a code per failure kind.
    #[must_use]
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        use quote_client::Error as Quote;

        match self {
            ApiError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::Quote(Quote::NoData(_)) => (StatusCode::NOT_FOUND, "NO_DATA"),
            ApiError::Quote(Quote::InvalidSymbol(_)) => (StatusCode::BAD_REQUEST, "INVALID_SYMBOL"),
            ApiError::Quote(Quote::Unauthorized(_)) => {
                (StatusCode::BAD_GATEWAY, "PROVIDER_UNAUTHORIZED")
            }
            ApiError::Quote(Quote::Unsupported(_)) => {
                (StatusCode::BAD_GATEWAY, "PROVIDER_UNSUPPORTED")
            }
            ApiError::Quote(Quote::Network(_)) => (StatusCode::BAD_GATEWAY, "UPSTREAM_UNAVAILABLE"),
            ApiError::Quote(Quote::Parse(_)) => (StatusCode::BAD_GATEWAY, "UPSTREAM_PARSE"),
            ApiError::Ledger(_) => (StatusCode::INTERNAL_SERVER_ERROR, "LEDGER_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::error!(code, error = %self, "request failed");
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}
