//! Mapping of [`Error`] onto HTTP responses.
//!
//! Caller mistakes become `{"msg": ...}` with a 4xx status and the message
//! shown as-is. Anything else is a 500 with `{"error": ...}` and is logged.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::error::Error;

/// Error returned by every handler.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    /// HTTP status for the wrapped error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        if self.0.is_client_error() {
            StatusCode::BAD_REQUEST
        } else if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.0.is_unauthorized() {
            StatusCode::UNAUTHORIZED
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(Error::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = if status.is_server_error() {
            error!(error = %self.0, "Request failed");
            json!({ "error": self.0.to_string() })
        } else {
            json!({ "msg": self.0.to_string() })
        };
        (status, Json(body)).into_response()
    }
}

/// Result type of handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
