//! Error types for the gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use taskgate_common::EnvelopeError;
use thiserror::Error;

use crate::allocation::AllocationError;

/// Failure delivering a task to the selected worker or reading its reply.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Failed to connect to worker at {url}: {reason}")]
    Connection { url: String, reason: String },
    #[error("Worker at {url} did not answer within {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },
    #[error("Worker at {url} returned {status}: {body}")]
    Status { url: String, status: u16, body: String },
    #[error("Undecodable reply from worker at {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// Errors from [`crate::Gateway::execute`].
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Allocation(AllocationError::NoCandidates) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::Allocation(_) => StatusCode::BAD_REQUEST,
            GatewayError::Dispatch(_) => StatusCode::BAD_GATEWAY,
            GatewayError::Envelope(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            GatewayError::Allocation(AllocationError::NoCandidates) => "no_candidates",
            GatewayError::Allocation(AllocationError::UnknownCriteria(_)) => "unknown_criteria",
            GatewayError::Allocation(AllocationError::UnknownStrategy(_)) => "unknown_strategy",
            GatewayError::Dispatch(_) => "dispatch_error",
            GatewayError::Envelope(_) => "invalid_arguments",
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "type": self.error_type(),
                "message": self.to_string()
            }
        }));

        (self.status_code(), body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            GatewayError::from(AllocationError::NoCandidates).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            GatewayError::from(AllocationError::UnknownCriteria("disk".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        let dispatch = DispatchError::Status {
            url: "http://w:9000/".into(),
            status: 500,
            body: "boom".into(),
        };
        assert_eq!(GatewayError::from(dispatch).status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_messages_are_transparent() {
        let err = GatewayError::from(AllocationError::NoCandidates);
        assert_eq!(err.to_string(), "No reachable workers to allocate");
    }

    #[test]
    fn test_timeout_keeps_sub_second_precision() {
        let err = DispatchError::Timeout {
            url: "http://w:9000/".into(),
            timeout_ms: 200,
        };
        assert_eq!(err.to_string(), "Worker at http://w:9000/ did not answer within 200ms");
    }
}
