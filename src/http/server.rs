//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Collect application routes (`App` builder)
//! - Auto-register page and static routes from the asset tree
//! - Resolve content added after startup when no route matches
//! - Create Axum Router and wire up middleware (tracing, timeout, request ID)
//! - Dispatch requests to the route table and build the response
//! - Bind server to listener and stop on the shutdown broadcast

use axum::{
    body::{self, Body},
    extract::State,
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use notify::RecommendedWatcher;
use serde_json::Value;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::assets::path::{VirtualPath, INDEX_DOCUMENT};
use crate::assets::{AssetSource, AssetStore, AssetWatcher, DirSource};
use crate::config::AppConfig;
use crate::error::{Outcome, ViewError};
use crate::http::context::Context;
use crate::http::group::Group;
use crate::http::handler::{handler, Handler};
use crate::http::request;
use crate::observability::metrics;
use crate::routing::{
    NavigationItem, Params, Pattern, Route, RouteInfo, RouteOptions, RouteOrigin, RouteTable,
};
use crate::template::TemplateComposer;
use crate::view::{ViewerKind, ViewerRegistry};

/// Application builder: register routes, then `build` or `run`.
pub struct App {
    config: AppConfig,
    source: Option<Arc<dyn AssetSource>>,
    viewer: Option<ViewerKind>,
    routes: RouteTable,
}

impl App {
    /// Create an app serving the asset tree at `config.assets.root`.
    pub fn new(config: AppConfig) -> Self {
        Self {
            viewer: config.views.default_viewer,
            config,
            source: None,
            routes: RouteTable::new(),
        }
    }

    /// Serve from another asset tree (embedded, in-memory, ...).
    pub fn with_source(mut self, source: Arc<dyn AssetSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Pin one viewer for every `view` call, skipping negotiation.
    pub fn with_viewer(mut self, viewer: ViewerKind) -> Self {
        self.viewer = Some(viewer);
        self
    }

    pub fn get<F, Fut>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.route(Some(Method::GET), path, RouteOptions::new(), handler(f))
    }

    pub fn post<F, Fut>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.route(Some(Method::POST), path, RouteOptions::new(), handler(f))
    }

    /// `GET` with route options, e.g. [`with_navigation`](crate::with_navigation).
    pub fn get_with<F, Fut>(&mut self, path: &str, options: RouteOptions, f: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.route(Some(Method::GET), path, options, handler(f))
    }

    pub fn post_with<F, Fut>(&mut self, path: &str, options: RouteOptions, f: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.route(Some(Method::POST), path, options, handler(f))
    }

    pub fn put<F, Fut>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.route(Some(Method::PUT), path, RouteOptions::new(), handler(f))
    }

    pub fn delete<F, Fut>(&mut self, path: &str, f: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        self.route(Some(Method::DELETE), path, RouteOptions::new(), handler(f))
    }

    /// Register with an optional method prefix: `"GET /func"` or `"/any"`.
    pub fn handle<F, Fut>(&mut self, pattern: &str, f: F) -> &mut Self
    where
        F: Fn(Context) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Outcome> + Send + 'static,
    {
        let (method, path) = split_method(pattern);
        self.route(method, path, RouteOptions::new(), handler(f))
    }

    /// Register a route with explicit method (`None` = any) and options.
    pub fn route(
        &mut self,
        method: Option<Method>,
        path: &str,
        options: RouteOptions,
        handler: Handler,
    ) -> &mut Self {
        self.routes.insert(Route {
            method,
            info: Arc::new(RouteInfo {
                pattern: Pattern::parse(path),
                options,
                origin: RouteOrigin::Registered,
            }),
            handler,
        });
        self
    }

    /// Start a group of routes under `prefix`.
    pub fn group(&mut self, prefix: &str) -> Group<'_> {
        Group::new(self, prefix)
    }

    /// Menu entries for registered routes carrying navigation options.
    pub fn navigation(&self) -> Vec<NavigationItem> {
        self.routes.navigation()
    }

    /// Resolve the asset tree, add generated routes and assemble the router.
    pub fn build(self) -> Result<HttpServer, ViewError> {
        let App {
            config,
            source,
            viewer,
            mut routes,
        } = self;

        let source = source.unwrap_or_else(|| Arc::new(DirSource::new(&config.assets.root)));
        let composer = Arc::new(TemplateComposer::new(
            source.clone(),
            config.views.cache_templates,
        ));
        let store = AssetStore::new(source.clone());

        let registered = routes.len();
        register_pages(&mut routes, &composer)?;
        register_static(&mut routes, &store)?;
        tracing::info!(
            registered,
            generated = routes.len() - registered,
            "Routes compiled"
        );

        // Errors are logged by the composer; requests surface them as 500s.
        if composer.build("").is_ok() {
            tracing::debug!("Default template set ready");
        }

        let watcher = match (config.assets.watch, source.root()) {
            (true, Some(root)) => match AssetWatcher::new(root, composer.clone()).run() {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::warn!(error = %e, "Asset watcher unavailable");
                    None
                }
            },
            _ => None,
        };

        let state = AppState {
            routes: Arc::new(routes),
            views: Arc::new(ViewerRegistry::new(composer.clone(), store.clone())),
            composer,
            store,
            viewer,
            max_body_size: config.security.max_body_size,
        };
        let router = HttpServer::build_router(&config, state);

        Ok(HttpServer {
            router,
            config,
            _watcher: watcher,
        })
    }

    /// Build and serve until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), ViewError> {
        self.build()?.run(listener, shutdown).await?;
        Ok(())
    }
}

/// Split `"GET /path"` into method and path.
fn split_method(pattern: &str) -> (Option<Method>, &str) {
    match pattern.split_once(' ') {
        Some((method, path)) if path.trim_start().starts_with('/') => {
            match Method::from_bytes(method.as_bytes()) {
                Ok(method) => (Some(method), path.trim_start()),
                Err(_) => (None, pattern),
            }
        }
        _ => (None, pattern),
    }
}

/// Add a generated GET route unless application code already owns the path.
fn register_generated(routes: &mut RouteTable, pattern: &str, origin: RouteOrigin, handler: Handler) {
    let get = Some(&Method::GET);
    let subtree = pattern.strip_suffix("{$}");
    if routes.contains(get, pattern) || subtree.is_some_and(|p| routes.contains(get, p)) {
        return;
    }

    routes.insert(Route {
        method: Some(Method::GET),
        info: Arc::new(RouteInfo {
            pattern: Pattern::parse(pattern),
            options: RouteOptions::new(),
            origin,
        }),
        handler,
    });
}

/// Render the page named by the route, with no data.
fn page_handler() -> Handler {
    handler(|ctx: Context| async move { Outcome::from(ctx.view(&Value::Null)) })
}

/// Serve the public file at the request path.
fn static_handler() -> Handler {
    handler(|ctx: Context| async move {
        Outcome::from(ctx.view_with(ViewerKind::Static, &Value::Null, Some(ctx.path())))
    })
}

/// `GET /<name>` for each page, plus the directory form for index pages.
fn register_pages(routes: &mut RouteTable, composer: &TemplateComposer) -> Result<(), ViewError> {
    let page = page_handler();

    for name in composer.page_names()? {
        register_generated(routes, &format!("/{}", name), RouteOrigin::Page, page.clone());
        if name == "index" {
            register_generated(routes, "/{$}", RouteOrigin::Page, page.clone());
        } else if let Some(dir) = name.strip_suffix("/index") {
            register_generated(routes, &format!("/{}/{{$}}", dir), RouteOrigin::Page, page.clone());
        }
    }
    Ok(())
}

/// `GET /<path>` for each public file, plus `/<dir>` and `/<dir>/` for index documents.
fn register_static(routes: &mut RouteTable, store: &AssetStore) -> Result<(), ViewError> {
    let serve = static_handler();

    let mut patterns = BTreeSet::new();
    for (_, file) in store.entries()? {
        patterns.insert(format!("/{}", file));
        if file == INDEX_DOCUMENT {
            patterns.insert("/{$}".to_string());
        } else if let Some(dir) = file.strip_suffix(&format!("/{}", INDEX_DOCUMENT)) {
            patterns.insert(format!("/{}", dir));
            patterns.insert(format!("/{}/{{$}}", dir));
        }
    }

    for pattern in patterns {
        register_generated(routes, &pattern, RouteOrigin::Static, serve.clone());
    }
    Ok(())
}

/// Page or public file for a path the route table does not know.
///
/// The table is compiled once; this lookup reads the live tree, so content
/// added after startup is served the same way as generated routes.
fn content_route(
    state: &AppState,
    method: &Method,
    host: &str,
    path: &str,
) -> Option<(Arc<RouteInfo>, Handler, Params)> {
    if *method != Method::GET && *method != Method::HEAD {
        return None;
    }
    let virtual_path = VirtualPath::parse(path).ok()?;

    let name = virtual_path.as_string();
    let page = if path.ends_with('/') {
        name.strip_suffix(".html").unwrap_or(&name)
    } else {
        name.as_str()
    };
    let route = |pattern: &str, origin: RouteOrigin, handler: Handler| {
        let info = RouteInfo {
            pattern: Pattern::parse(pattern),
            options: RouteOptions::new(),
            origin,
        };
        Some((Arc::new(info), handler, Params::new()))
    };

    // A broken template tree is logged by the composer; public files still resolve
    if state.composer.has_view(host, page, false).unwrap_or(false) {
        return route(&format!("/{}", page), RouteOrigin::Page, page_handler());
    }

    if state.store.resolve_path(host, &virtual_path).is_ok() {
        return route(path, RouteOrigin::Static, static_handler());
    }
    None
}

/// Application state injected into the dispatcher.
#[derive(Clone)]
struct AppState {
    routes: Arc<RouteTable>,
    views: Arc<ViewerRegistry>,
    composer: Arc<TemplateComposer>,
    store: AssetStore,
    viewer: Option<ViewerKind>,
    max_body_size: usize,
}

/// A built application, ready to serve.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    _watcher: Option<RecommendedWatcher>,
}

impl HttpServer {
    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(dispatch))
            .route("/{*path}", any(dispatch))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The assembled router, e.g. for in-process requests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let HttpServer {
            router,
            config,
            _watcher: watcher,
        } = self;

        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            request_timeout_secs = config.timeouts.request_secs,
            watch = config.assets.watch,
            "HTTP server starting"
        );

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        drop(watcher);
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Look up the route, run its handler against a fresh context, finish the response.
async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();
    let path = parts.uri.path().to_string();

    let found = match state.routes.find(&method, &path) {
        Some((route, params)) => Some((route.info.clone(), route.handler.clone(), params)),
        None => content_route(&state, &method, &request::host_scope(&parts), &path),
    };
    let Some((info, handle, params)) = found else {
        tracing::debug!(method = %method, path = %path, "No route matched");
        metrics::record_request(method.as_str(), StatusCode::NOT_FOUND.as_u16(), "none", start);
        return StatusCode::NOT_FOUND.into_response();
    };

    let body = match body::to_bytes(body, state.max_body_size).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(path = %path, error = %e, "Request body rejected");
            let status = StatusCode::PAYLOAD_TOO_LARGE;
            metrics::record_request(method.as_str(), status.as_u16(), "none", start);
            return status.into_response();
        }
    };

    let ctx = Context::new(parts, body, info, params, state.views.clone(), state.viewer);
    let outcome = handle(ctx.clone()).await;
    let (response, viewer) = ctx.finish(outcome);

    metrics::record_request(
        method.as_str(),
        response.status().as_u16(),
        viewer.map_or("none", ViewerKind::as_str),
        start,
    );
    response
}
