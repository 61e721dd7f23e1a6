use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Router,
    extract::{RawPathParams, Request, rejection::RawPathParamsRejection},
    http::StatusCode,
    routing::{MethodFilter, on},
};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::info;

use super::adapter::{DispatchOptions, HandlerAdapter};
use super::models::RouteEntry;
use super::pages::{PageRenderer, PlainPages, error_page};
use crate::config::Config;
use crate::handlers::{HttpMethod, Module, RegistryError, RouteRegistrar, RouteSink};
use crate::observability::DispatchMetrics;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Route table backed by an axum [`Router`]
///
/// Routes axum would refuse (the same method twice on a path, two capture
/// spellings of one pattern, malformed paths) come back as [`RegistryError`]s.
pub struct AxumRoutes {
    router: Router,
    table: Vec<RouteEntry>,
}

impl AxumRoutes {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            table: Vec::new(),
        }
    }

    pub fn table(&self) -> &[RouteEntry] {
        &self.table
    }

    /// Finishes the router: unmatched requests get a rendered error page and
    /// compressed request bodies are decoded before reaching adapters
    pub fn into_router(self, pages: Arc<dyn PageRenderer>, metrics: Arc<DispatchMetrics>) -> Router {
        self.router
            .fallback(move |request: Request| {
                let pages = Arc::clone(&pages);
                let metrics = Arc::clone(&metrics);
                async move {
                    metrics.page_rendered();
                    error_page(pages.as_ref(), request.method(), request.uri(), StatusCode::NOT_FOUND)
                }
            })
            .layer(RequestDecompressionLayer::new())
    }
}

impl Default for AxumRoutes {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteSink for AxumRoutes {
    fn register(&mut self, method: HttpMethod, path: &str, adapter: HandlerAdapter) -> Result<(), RegistryError> {
        self.check_route(method, path)?;

        let handler = adapter.handler();
        self.table.push(RouteEntry {
            method,
            path: path.to_string(),
            handler: handler.name().to_string(),
            signature: handler.signature().to_string(),
        });

        let filter = match method {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
        };
        let route = on(
            filter,
            move |params: Result<RawPathParams, RawPathParamsRejection>, request: Request| {
                let adapter = adapter.clone();
                async move { adapter.handle(params, request).await }
            },
        );

        let router = std::mem::replace(&mut self.router, Router::new());
        self.router = router.route(path, route);
        Ok(())
    }
}

impl AxumRoutes {
    /// Refuses what `Router::route` would panic on: malformed paths, a
    /// method registered twice on one path, and two spellings of the same
    /// pattern such as `/item/{id}` and `/item/{key}`
    fn check_route(&self, method: HttpMethod, path: &str) -> Result<(), RegistryError> {
        let invalid = |reason| RegistryError::InvalidPath {
            path: path.to_string(),
            reason,
        };
        if !path.starts_with('/') {
            return Err(invalid("paths must start with `/`"));
        }
        if path
            .split('/')
            .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
        {
            return Err(invalid("captures are written `{name}` or `{*name}`"));
        }

        let shape = route_shape(path);
        for entry in &self.table {
            if entry.path == path {
                if entry.method == method {
                    return Err(RegistryError::DuplicateRoute {
                        method,
                        path: path.to_string(),
                    });
                }
            } else if route_shape(&entry.path) == shape {
                return Err(RegistryError::ConflictingRoute {
                    path: path.to_string(),
                    existing: entry.path.clone(),
                });
            }
        }
        Ok(())
    }
}

/// A path pattern with capture names erased: `/item/{id}` becomes `/item/{}`
fn route_shape(path: &str) -> String {
    let mut shape = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(start) = rest.find('{') {
        shape.push_str(&rest[..start]);
        match rest[start..].find('}') {
            Some(end) => {
                let capture = &rest[start + 1..start + end];
                shape.push_str(if capture.starts_with('*') { "{*}" } else { "{}" });
                rest = &rest[start + end + 1..];
            }
            None => {
                shape.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    shape.push_str(rest);
    shape
}

/// Everything needed to serve a module
pub struct App {
    pub router: Router,
    pub routes: Vec<RouteEntry>,
    pub metrics: Arc<DispatchMetrics>,
}

/// Registers every annotated handler of `module` and builds the router
pub fn build_app(
    module: &Module,
    options: DispatchOptions,
    pages: Arc<dyn PageRenderer>,
) -> Result<App, RegistryError> {
    let metrics = Arc::new(DispatchMetrics::new());
    let registrar = RouteRegistrar::new(options, Arc::clone(&metrics));

    let mut routes = AxumRoutes::new();
    registrar.add_routes(&mut routes, module)?;

    let table = routes.table().to_vec();
    let router = routes.into_router(pages, Arc::clone(&metrics));

    Ok(App {
        router,
        routes: table,
        metrics,
    })
}

pub async fn run(config: Config, module: Module, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);
    let options = DispatchOptions::from(&config);
    info!(
        strict_required = options.strict_required,
        max_body_bytes = options.max_body_bytes,
        "Dispatch options"
    );

    let app = build_app(&module, options, Arc::new(PlainPages))?;

    let listener = TcpListener::bind(address).await?;
    info!(%address, routes = app.routes.len(), "routebind listening");

    axum::serve(listener, app.router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let snapshot = app.metrics.snapshot();
    info!(
        dispatched = snapshot.requests_dispatched,
        bad_requests = snapshot.bad_requests,
        domain_errors = snapshot.domain_errors,
        "Server stopped"
    );

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::{HandlerFn, HandlerResult, Signature, get, post};
    use axum::response::IntoResponse;

    fn handler(name: &str) -> HandlerFn {
        HandlerFn::from_fn(name, Signature::new(), |_| async {
            HandlerResult::Ok(().into_response())
        })
    }

    fn module(routes: Vec<HandlerFn>) -> Module {
        routes
            .into_iter()
            .fold(Module::new("routes"), |module, handler| module.with_handler(handler))
    }

    fn build(module: &Module) -> Result<App, RegistryError> {
        build_app(module, DispatchOptions::default(), Arc::new(PlainPages))
    }

    #[test]
    fn test_route_shape() {
        assert_eq!(route_shape("/item/{id}"), "/item/{}");
        assert_eq!(route_shape("/a/{x}/b/{*rest}"), "/a/{}/b/{*}");
        assert_eq!(route_shape("/plain"), "/plain");
    }

    #[test]
    fn test_duplicate_method_route_is_an_error() {
        let module = module(vec![
            get("/same").apply(handler("first")),
            get("/same").apply(handler("second")),
        ]);

        let err = build(&module).err().unwrap();
        assert!(matches!(
            err,
            RegistryError::DuplicateRoute { method: HttpMethod::Get, ref path } if path == "/same"
        ));
    }

    #[test]
    fn test_same_path_different_methods_share_a_route() {
        let module = module(vec![
            get("/thing").apply(handler("read")),
            post("/thing").apply(handler("write")),
        ]);

        let app = build(&module).unwrap();
        assert_eq!(app.routes.len(), 2);
    }

    #[test]
    fn test_conflicting_capture_names_are_an_error() {
        let module = module(vec![
            get("/item/{id}").apply(handler("read")),
            post("/item/{key}").apply(handler("write")),
        ]);

        let err = build(&module).err().unwrap();
        assert!(matches!(
            err,
            RegistryError::ConflictingRoute { ref existing, .. } if existing == "/item/{id}"
        ));
    }

    #[test]
    fn test_malformed_paths_are_errors() {
        for path in ["no-slash", "/item/:id", "/files/*rest"] {
            let mut routes = AxumRoutes::new();
            let adapter = HandlerAdapter::new(
                get(path).apply(handler("bad")),
                DispatchOptions::default(),
                Arc::default(),
            )
            .unwrap();

            let err = routes.register(HttpMethod::Get, path, adapter).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidPath { .. }));
            assert!(routes.table().is_empty());
        }
    }
}
