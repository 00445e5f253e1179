use std::error::Error as StdError;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use recache_api_types::{ErrorResponse, MSG_NOT_FOUND};

use crate::application::error::ErrorReport;
use crate::application::records::RecordServiceError;
use crate::application::repos::RepoError;

/// Error surface of the HTTP API: `{"error": message}` plus an [`ErrorReport`]
/// for the response logger.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    report: ErrorReport,
}

impl ApiError {
    pub fn new(source: &'static str, status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let report = ErrorReport::from_message(source, status, message.clone());
        Self {
            status,
            message,
            report,
        }
    }

    pub fn not_found(source: &'static str) -> Self {
        Self::new(source, StatusCode::NOT_FOUND, MSG_NOT_FOUND)
    }

    pub fn bad_request(source: &'static str, message: impl Into<String>) -> Self {
        Self::new(source, StatusCode::BAD_REQUEST, message)
    }

    /// A collaborator failure. The body carries the top-level message, the
    /// report carries the whole chain.
    pub fn internal(source: &'static str, err: &dyn StdError) -> Self {
        let status = StatusCode::INTERNAL_SERVER_ERROR;
        Self {
            status,
            message: err.to_string(),
            report: ErrorReport::from_error(source, status, err),
        }
    }

    /// Replace the client-facing message; the report keeps the original detail.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn from_service(source: &'static str, err: RecordServiceError) -> Self {
        match err {
            RecordServiceError::NotFound => Self::not_found(source),
            RecordServiceError::MalformedBody(message) => Self::bad_request(source, message),
            RecordServiceError::Store(RepoError::InvalidInput { message }) => {
                Self::bad_request(source, message)
            }
            RecordServiceError::Store(err) => Self::internal(source, &err),
            RecordServiceError::Cache(err) => Self::internal(source, &err),
        }
    }

    pub fn from_rejection(source: &'static str, rejection: JsonRejection) -> Self {
        // Wrong content type and syntax errors are both malformed bodies.
        let status = match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(source, status, rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.message,
        };
        let mut response = (self.status, Json(body)).into_response();
        self.report.attach(&mut response);
        response
    }
}
