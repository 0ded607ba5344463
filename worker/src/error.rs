//! Error types for the worker.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use taskgate_common::EnvelopeError;

/// Errors surfaced by the worker's HTTP listeners.
///
/// Failures inside a task are not errors here; they travel back to the
/// gateway inside the execution result.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid envelope: {0}")]
    InvalidEnvelope(#[from] EnvelopeError),

    #[error("Client {0} is not allowed to query this worker")]
    Forbidden(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::InvalidEnvelope(_) => (StatusCode::BAD_REQUEST, "invalid_envelope"),
            Error::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
