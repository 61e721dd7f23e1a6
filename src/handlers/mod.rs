//! Handler side of routebind
//!
//! Handlers are plain async functions over [`ResolvedArguments`] that declare
//! what they want through a [`Signature`]. They never parse requests.
//!
//! ## Key Components
//!
//! - [`Signature`] / [`classify`] - declared parameters and their classification
//! - [`HandlerDescriptor`] - immutable per-route view used by the resolver
//! - [`get`] / [`post`] - route annotations
//! - [`Handler`] / [`HandlerFn`] - handler trait and its named wrapper
//! - [`ApiError`] - domain error raised by handlers
//! - [`Module`] / [`RouteRegistrar`] - discovery and registration of routes
//!
//! ## Example
//!
//! ```rust,ignore
//! use routebind::handlers::{HandlerFn, Module, Signature, post};
//!
//! let echo = post("/echo").apply(HandlerFn::from_fn(
//!     "echo",
//!     Signature::new().request().keyword("x"),
//!     |args| async move { /* args.require_str("x")? ... */ },
//! ));
//! let module = Module::new("app").with_handler(echo);
//! ```

mod annotate;
mod registry;
mod signature;
mod traits;
pub(crate) mod types;

pub use annotate::{HandlerFn, RouteAnnotation, RouteMeta, get, post};
pub use registry::{Export, Module, RegistryError, RouteRegistrar, RouteSink};
pub use signature::{
    Classification, HandlerDescriptor, Param, ParamKind, REQUEST_PARAM, Signature,
    SignatureError, classify,
};
pub use traits::{ApiError, FnHandler, Handler, HandlerResult};
pub use types::{HttpMethod, RequestInfo, ResolvedArguments};
