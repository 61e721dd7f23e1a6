//! Wire shapes produced by the dispatch layer.
//!
//! - [`FailureBody`] is returned for requests rejected before dispatch:
//!   `{"status": -1, "data": null, "message": "..."}`
//! - Domain errors raised by handlers serialize as
//!   [`ApiError`](crate::handlers::ApiError): `{"error", "data", "message"}`
//! - [`RouteEntry`] describes one registered route for listings

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::handlers::HttpMethod;

/// Status value carried by every pre-dispatch failure
pub const FAILURE_STATUS: i32 = -1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureBody {
    pub status: i32,
    pub data: Value,
    pub message: String,
}

impl FailureBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: FAILURE_STATUS,
            data: Value::Null,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteEntry {
    pub method: HttpMethod,
    pub path: String,
    pub handler: String,
    /// Rendered parameter list, e.g. `(request, *, x)`
    pub signature: String,
}
