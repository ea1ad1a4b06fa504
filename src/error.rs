//! API error types with HTTP status code mapping.
//!
//! [`ApiError`] is the central error type for the HTTP layer. Each variant
//! maps to a specific HTTP status code and a JSON error body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::repository::StoreError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "status": "Invalid request",
///   "code": 1001,
///   "error": "missing required record fields"
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// User-level status text.
    pub status: &'static str,
    /// Application-specific error code.
    pub code: u32,
    /// Underlying error message, for debugging.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category          | HTTP Status                  |
/// |-----------|-------------------|------------------------------|
/// | 1000–1999 | Request           | 400 Bad Request / 403        |
/// | 2000–2999 | Not Found         | 404 Not Found                |
/// | 3000–3999 | Server            | 500 Internal Server Error    |
/// | 4000–4999 | Rendering         | 422 Unprocessable Entity     |
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The addressed record does not exist.
    #[error("resource not found")]
    NotFound,

    /// Request input was malformed or incomplete.
    #[error("{0}")]
    InvalidRequest(String),

    /// The response could not be produced.
    #[error("{0}")]
    Render(String),

    /// A repository operation failed while serving the request.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The caller is not allowed to perform changes.
    #[error("{0}")]
    Forbidden(String),

    /// Internal server error.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::Store(_) => 1002,
            Self::Forbidden(_) => 1003,
            Self::NotFound => 2001,
            Self::Internal(_) => 3000,
            Self::Render(_) => 4001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) | Self::Store(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Render(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the short, user-level status text for this variant.
    #[must_use]
    pub const fn status_text(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) | Self::Store(_) => "Invalid request",
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound => "Resource not found",
            Self::Render(_) => "Error rendering response",
            Self::Internal(_) => "Internal server error",
        }
    }

    /// Builds the JSON body for this error.
    #[must_use]
    pub fn to_body(&self) -> ErrorResponse {
        let error = match self {
            Self::NotFound => None,
            other => Some(other.to_string()),
        };
        ErrorResponse {
            status: self.status_text(),
            code: self.error_code(),
            error,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let mut response = axum::Json(self.to_body()).into_response();
        *response.status_mut() = status;
        response
    }
}
