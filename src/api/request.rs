use axum::body::Body;
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::sync::Arc;

use super::error::BadRequest;
use crate::handlers::RequestInfo;

/// A request as handed to the resolver: routing data plus a materialized body
#[derive(Debug, Clone)]
pub struct IncomingRequest {
    info: Arc<RequestInfo>,
    body: Bytes,
}

impl IncomingRequest {
    pub fn new(info: RequestInfo, body: impl Into<Bytes>) -> Self {
        Self {
            info: Arc::new(info),
            body: body.into(),
        }
    }

    pub fn info(&self) -> &RequestInfo {
        &self.info
    }

    pub fn shared_info(&self) -> Arc<RequestInfo> {
        Arc::clone(&self.info)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}

/// Reads the whole request body, refusing anything larger than `limit`
///
/// Decompression is handled by the router's middleware, so `limit` applies
/// to the decoded bytes.
pub async fn read_body(body: Body, limit: usize) -> Result<Bytes, BadRequest> {
    let collected = Limited::new(body, limit).collect().await.map_err(|err| {
        if err.downcast_ref::<LengthLimitError>().is_some() {
            BadRequest::PayloadTooLarge(limit)
        } else {
            BadRequest::Body(err.to_string())
        }
    })?;

    Ok(collected.to_bytes())
}
