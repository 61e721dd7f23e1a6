use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;

use super::models::FailureBody;

/// Request rejected by the argument resolver before the handler runs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadRequest {
    #[error("Missing content-type")]
    MissingContentType,
    #[error("json body must be object")]
    JsonNotObject,
    #[error("Unsupported Content-Type:{0}")]
    UnsupportedContentType(String),
    /// Carries the parameter name for logs; the client sees a fixed message
    #[error("Missing someone argument")]
    MissingArgument(String),
    #[error("invalid json body: {0}")]
    InvalidJson(String),
    #[error("invalid form body: {0}")]
    InvalidForm(String),
    #[error("payload exceeds {0} bytes")]
    PayloadTooLarge(usize),
    #[error("failed to read request body: {0}")]
    Body(String),
}

impl BadRequest {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BadRequest::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for BadRequest {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        (status, Json(FailureBody::new(self.to_string()))).into_response()
    }
}

impl From<serde_json::Error> for BadRequest {
    fn from(value: serde_json::Error) -> Self {
        BadRequest::InvalidJson(value.to_string())
    }
}
