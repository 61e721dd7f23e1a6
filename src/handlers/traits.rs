use async_trait::async_trait;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use thiserror::Error;

use super::types::ResolvedArguments;

/// Domain-level failure raised by handler logic.
///
/// Rendered as `{error, data, message}`; the only error type the adapter
/// translates. Everything else belongs to the transport.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{error}: {message}")]
pub struct ApiError {
    pub error: String,
    pub data: Value,
    pub message: String,
}

impl ApiError {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            data: Value::Null,
            message: String::new(),
        }
    }

    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = data.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Input value is malformed; `data` names the offending field
    pub fn invalid_value(field: &str, message: impl Into<String>) -> Self {
        Self::new("value:invalid")
            .with_data(field)
            .with_message(message)
    }

    /// Referenced resource does not exist; `data` names the field
    pub fn not_found(field: &str, message: impl Into<String>) -> Self {
        Self::new("value:notfound")
            .with_data(field)
            .with_message(message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new("permission:forbidden")
            .with_data("permission")
            .with_message(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Domain failures travel inside a successful envelope
        (StatusCode::OK, Json(self)).into_response()
    }
}

pub type HandlerResult = Result<Response, ApiError>;

/// Application-supplied route logic
///
/// Receives exactly the arguments its signature asked for and never parses
/// the request itself.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn call(&self, args: ResolvedArguments) -> HandlerResult;
}

/// Adapts an async closure into a [`Handler`]
pub struct FnHandler<F>(F);

impl<F> FnHandler<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(ResolvedArguments) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn call(&self, args: ResolvedArguments) -> HandlerResult {
        (self.0)(args).await
    }
}
