//! # HTTP Errors
//!
//! Error type returned by route handlers, rendered as
//! `{"error": message, "code": status}`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::countries::CountryError;

/// Result type for route handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// HTTP layer errors
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    // ==================
    // Client Errors (4xx)
    // ==================
    /// Path segment could not be decoded
    #[error("Invalid path parameter: {0}")]
    InvalidPathParam(String),

    /// Request body could not be decoded
    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    /// Nothing to answer with
    #[error("{0}")]
    NotFound(String),

    // ==================
    // Domain Errors
    // ==================
    #[error("{0}")]
    Country(#[from] CountryError),
}

impl ApiError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidPathParam(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,

            ApiError::Country(CountryError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Country(CountryError::MissingField(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Country(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Country(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidBody(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidPathParam(rejection.body_text())
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl From<ApiError> for ErrorResponse {
    fn from(err: ApiError) -> Self {
        Self {
            code: err.status_code().as_u16(),
            error: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = Json(ErrorResponse::from(self));
        (status, body).into_response()
    }
}
