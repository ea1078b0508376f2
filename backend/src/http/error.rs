//! HTTP error handling and response types.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{BookingError, ErrorKind};

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Outcome of a booking operation
    Booking(BookingError),
    /// Request body or query string could not be decoded
    BadRequest(String),
}

/// HTTP status for a booking failure.
pub fn status_for(err: &BookingError) -> StatusCode {
    match err {
        BookingError::StorageError(e) if e.is_retryable() => StatusCode::SERVICE_UNAVAILABLE,
        _ => match err.kind() {
            ErrorKind::MalformedInput
            | ErrorKind::InvalidTimezone
            | ErrorKind::BoundaryViolation
            | ErrorKind::OutsideAvailability => StatusCode::BAD_REQUEST,
            ErrorKind::CoachNotFound | ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::SlotConflict => StatusCode::CONFLICT,
            ErrorKind::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
        },
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::Booking(err) => {
                let status = status_for(&err);
                let body = match &err {
                    BookingError::StorageError(source) => {
                        tracing::error!(error = %source, "storage failure");
                        ApiError::new(err.kind().code(), "storage failure")
                            .with_details(source.context().to_string())
                    }
                    _ => ApiError::new(err.kind().code(), err.to_string()),
                };
                (status, body)
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
        };

        (status, Json(error)).into_response()
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError::Booking(err)
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
