//! HTTP error mapping.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::application::use_cases::QueryError;
use crate::infrastructure::feed::{DecodeError, SignatureError};

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The route does not accept this method.
    #[error("Method not allowed")]
    MethodNotAllowed,

    /// Webhook signature check failed.
    #[error("Invalid signature: {0}")]
    Unauthorized(#[from] SignatureError),

    /// Webhook body could not be decoded.
    #[error("Invalid payload: {0}")]
    Validation(#[from] DecodeError),

    /// OHLC query failed.
    #[error("Query failed: {0}")]
    Query(#[from] QueryError),

    /// The request exceeded its time budget.
    #[error("Request timed out")]
    Timeout,

    /// Unexpected middleware failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Status code for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unauthorized(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Query(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }

    const fn code(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Validation(_) => "BAD_REQUEST",
            Self::Query(_) | Self::Internal(_) => "INTERNAL_ERROR",
            Self::Timeout => "TIMEOUT",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Query(e) => {
                tracing::error!(error = %e, "OHLC query failed");
                "Internal server error".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "Request failed in middleware");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message,
        }));

        (status, body).into_response()
    }
}
