use axum::{
    extract::{RawPathParams, Request, rejection::RawPathParamsRejection},
    http::Method,
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{error, info};

use super::error::BadRequest;
use super::request::{IncomingRequest, read_body};
use super::resolver::ArgumentResolver;
use super::utils;
use crate::config::Config;
use crate::handlers::{
    HandlerDescriptor, HandlerFn, RegistryError, RequestInfo, ResolvedArguments, classify,
};
use crate::observability::DispatchMetrics;

/// Per-route dispatch settings
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    /// Reject missing required parameters even when the handler does not
    /// take the request object
    pub strict_required: bool,
    /// Upper bound for request bodies that get parsed
    pub max_body_bytes: usize,
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            strict_required: false,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

impl From<&Config> for DispatchOptions {
    fn from(config: &Config) -> Self {
        Self {
            strict_required: config.dispatch.strict_required,
            max_body_bytes: config.server.max_body_bytes,
        }
    }
}

/// Binds one handler to its descriptor and turns requests into responses
#[derive(Debug, Clone)]
pub struct HandlerAdapter {
    inner: Arc<AdapterInner>,
}

#[derive(Debug)]
struct AdapterInner {
    handler: HandlerFn,
    descriptor: HandlerDescriptor,
    resolver: ArgumentResolver,
    max_body_bytes: usize,
    metrics: Arc<DispatchMetrics>,
}

impl HandlerAdapter {
    /// Classifies the handler's signature; the handler must carry a route
    pub fn new(
        handler: HandlerFn,
        options: DispatchOptions,
        metrics: Arc<DispatchMetrics>,
    ) -> Result<Self, RegistryError> {
        let route = handler
            .route()
            .cloned()
            .ok_or_else(|| RegistryError::MissingRoute(handler.name().to_string()))?;
        let classification = classify(handler.name(), handler.signature())?;
        let descriptor = HandlerDescriptor::new(route.method, route.path, classification);

        Ok(Self {
            inner: Arc::new(AdapterInner {
                handler,
                descriptor,
                resolver: ArgumentResolver::new(options.strict_required),
                max_body_bytes: options.max_body_bytes,
                metrics,
            }),
        })
    }

    pub fn descriptor(&self) -> &HandlerDescriptor {
        &self.inner.descriptor
    }

    pub fn handler(&self) -> &HandlerFn {
        &self.inner.handler
    }

    /// Entry point for the router: path parameters plus the raw request
    pub async fn handle(
        &self,
        params: Result<RawPathParams, RawPathParamsRejection>,
        request: Request,
    ) -> Response {
        let path_params = match params {
            Ok(params) => params
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            Err(RawPathParamsRejection::MissingPathParams(_)) => Vec::new(),
            Err(rejection) => return rejection.into_response(),
        };

        let (parts, body) = request.into_parts();
        let info = RequestInfo::new(parts.method, parts.uri, parts.headers, path_params);

        // Bodies are only consumed when the resolver will look at them, and
        // only once their content type is known to be decodable
        let body = if self.inner.descriptor.needs_parsing() && *info.method() == Method::POST {
            if let Err(rejection) = utils::request_body_kind(&info) {
                return self.reject(&info, rejection);
            }
            match read_body(body, self.inner.max_body_bytes).await {
                Ok(bytes) => bytes,
                Err(rejection) => return self.reject(&info, rejection),
            }
        } else {
            Bytes::new()
        };

        self.dispatch(IncomingRequest::new(info, body)).await
    }

    pub async fn resolve(&self, request: &IncomingRequest) -> Result<ResolvedArguments, BadRequest> {
        self.inner
            .resolver
            .resolve(&self.inner.descriptor, request)
            .await
    }

    /// Resolves arguments and calls the handler; domain errors become
    /// `{error, data, message}` responses
    pub async fn dispatch(&self, request: IncomingRequest) -> Response {
        self.inner.metrics.request_dispatched();

        let args = match self.resolve(&request).await {
            Ok(args) => args,
            Err(rejection) => return self.reject(request.info(), rejection),
        };

        info!(handler = %self.inner.handler.name(), arguments = ?args, "call arguments");

        match self.inner.handler.call(args).await {
            Ok(response) => response,
            Err(err) => {
                self.inner.metrics.domain_error();
                err.into_response()
            }
        }
    }

    fn reject(&self, info: &RequestInfo, rejection: BadRequest) -> Response {
        self.inner.metrics.bad_request();
        error!(
            method = %info.method(),
            path = %info.path(),
            message = %rejection,
            "Can not access"
        );
        rejection.into_response()
    }
}
