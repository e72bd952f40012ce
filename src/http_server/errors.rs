//! HTTP error mapping
//!
//! Validation and token errors → 400 with the message verbatim,
//! not-found → 404, store failures → 500 with a generic message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::executor::QueryError;
use crate::filter::ValidationError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

/// Error returned by recipe handlers
#[derive(Debug)]
pub struct ApiError(pub QueryError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            QueryError::Validation(_) | QueryError::InvalidToken { .. } => StatusCode::BAD_REQUEST,
            QueryError::NotFound(_) => StatusCode::NOT_FOUND,
            QueryError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Request body or path that could not be decoded
    pub fn malformed(reason: impl Into<String>) -> Self {
        ApiError(QueryError::Validation(ValidationError::MalformedPayload(
            reason.into(),
        )))
    }
}

impl From<QueryError> for ApiError {
    fn from(err: QueryError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: self.0.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}
