use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use super::annotate::HandlerFn;
use super::signature::SignatureError;
use super::types::HttpMethod;
use crate::api::{DispatchOptions, HandlerAdapter};
use crate::observability::DispatchMetrics;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("@get or @post not defined in {0}")]
    MissingRoute(String),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("duplicate route {method} {path}: the router refuses overlapping method routes")]
    DuplicateRoute { method: HttpMethod, path: String },

    #[error("route {path} conflicts with registered route {existing}")]
    ConflictingRoute { path: String, existing: String },

    #[error("invalid route path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },
}

/// One named value exported by a [`Module`]
#[derive(Debug, Clone)]
pub enum Export {
    Handler(HandlerFn),
    Value(Value),
}

/// Ordered collection of exports scanned for annotated handlers
#[derive(Debug, Clone, Default)]
pub struct Module {
    name: String,
    exports: Vec<(String, Export)>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exports: Vec::new(),
        }
    }

    /// Exports a handler under its own name
    pub fn with_handler(mut self, handler: HandlerFn) -> Self {
        self.exports
            .push((handler.name().to_string(), Export::Handler(handler)));
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.exports.push((name.into(), Export::Value(value.into())));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Handlers carrying route metadata, in export order
    pub fn routed_handlers(&self) -> impl Iterator<Item = &HandlerFn> {
        self.exports.iter().filter_map(|(_, export)| match export {
            Export::Handler(handler) if handler.route().is_some() => Some(handler),
            _ => None,
        })
    }
}

/// The external router's registration surface
///
/// Conflict policy belongs to the sink; refusals come back as errors.
pub trait RouteSink {
    fn register(&mut self, method: HttpMethod, path: &str, adapter: HandlerAdapter) -> Result<(), RegistryError>;
}

/// Wraps annotated handlers in adapters and hands them to a [`RouteSink`]
#[derive(Debug, Clone, Default)]
pub struct RouteRegistrar {
    options: DispatchOptions,
    metrics: Arc<DispatchMetrics>,
}

impl RouteRegistrar {
    pub fn new(options: DispatchOptions, metrics: Arc<DispatchMetrics>) -> Self {
        Self { options, metrics }
    }

    /// Registers a single handler; it must carry route metadata
    pub fn add_route<S: RouteSink>(&self, sink: &mut S, handler: &HandlerFn) -> Result<(), RegistryError> {
        let adapter = HandlerAdapter::new(handler.clone(), self.options, Arc::clone(&self.metrics))?;
        let descriptor = adapter.descriptor();
        let (method, path) = (descriptor.method(), descriptor.path().to_string());

        info!(
            "add route {} {} => {}{}",
            method,
            path,
            handler.name(),
            handler.signature()
        );
        sink.register(method, &path, adapter)
    }

    /// Registers every routed handler of `module`; returns how many were added
    ///
    /// Unannotated handlers and plain values are skipped. The first invalid
    /// signature aborts registration.
    pub fn add_routes<S: RouteSink>(&self, sink: &mut S, module: &Module) -> Result<usize, RegistryError> {
        let mut count = 0;
        for handler in module.routed_handlers() {
            self.add_route(sink, handler)?;
            count += 1;
        }
        info!(module = %module.name(), routes = count, "Registered module routes");
        Ok(count)
    }
}
