//! Route annotation
//!
//! [`get`] and [`post`] produce a [`RouteAnnotation`] which, applied to a
//! [`HandlerFn`], records where the handler should be mounted. The handler's
//! behavior and signature are left untouched.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use super::signature::Signature;
use super::traits::{FnHandler, Handler, HandlerResult};
use super::types::{HttpMethod, ResolvedArguments};

/// Method and path a handler is mounted at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMeta {
    pub method: HttpMethod,
    pub path: String,
}

/// A named handler together with its declared signature and optional route
#[derive(Clone)]
pub struct HandlerFn {
    name: String,
    signature: Signature,
    handler: Arc<dyn Handler>,
    route: Option<RouteMeta>,
}

impl HandlerFn {
    pub fn new(name: impl Into<String>, signature: Signature, handler: impl Handler + 'static) -> Self {
        Self {
            name: name.into(),
            signature,
            handler: Arc::new(handler),
            route: None,
        }
    }

    /// Wraps an async closure taking the resolved arguments
    pub fn from_fn<F, Fut>(name: impl Into<String>, signature: Signature, f: F) -> Self
    where
        F: Fn(ResolvedArguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        Self::new(name, signature, FnHandler::new(f))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn route(&self) -> Option<&RouteMeta> {
        self.route.as_ref()
    }

    pub async fn call(&self, args: ResolvedArguments) -> HandlerResult {
        self.handler.call(args).await
    }
}

impl fmt::Debug for HandlerFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn")
            .field("name", &self.name)
            .field("signature", &format_args!("{}", self.signature))
            .field("route", &self.route)
            .finish_non_exhaustive()
    }
}

/// Transform that attaches route metadata to a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteAnnotation {
    meta: RouteMeta,
}

impl RouteAnnotation {
    /// Overwrites any route previously attached to `handler`
    pub fn apply(&self, mut handler: HandlerFn) -> HandlerFn {
        handler.route = Some(self.meta.clone());
        handler
    }
}

fn annotation(method: HttpMethod, path: impl Into<String>) -> RouteAnnotation {
    RouteAnnotation {
        meta: RouteMeta {
            method,
            path: path.into(),
        },
    }
}

pub fn get(path: impl Into<String>) -> RouteAnnotation {
    annotation(HttpMethod::Get, path)
}

pub fn post(path: impl Into<String>) -> RouteAnnotation {
    annotation(HttpMethod::Post, path)
}
