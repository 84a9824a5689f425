//! Route groups sharing a path prefix and middleware.

use axum::http::Method;
use std::future::Future;

use crate::error::Outcome;
use crate::http::context::Context;
use crate::http::handler::{handler, wrap, Handler, Middleware};
use crate::http::server::App;
use crate::routing::RouteOptions;

/// Routes registered under a common prefix.
///
/// Middleware applies to routes registered after `use_middleware`.
pub struct Group<'a> {
    app: &'a mut App,
    prefix: String,
    middleware: Vec<Middleware>,
}

impl<'a> Group<'a> {
    pub(crate) fn new(app: &'a mut App, prefix: &str) -> Self {
        Self {
            app,
            prefix: prefix.trim_end_matches('/').to_string(),
            middleware: Vec::new(),
        }
    }

    /// Add middleware; the first added runs outermost.
    pub fn use_middleware(&mut self, middleware: Middleware) -> &mut Self {
        self.middleware.push(middleware);
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

    /// Register under the group prefix with explicit method and options.
    pub fn route(
        &mut self,
        method: Option<Method>,
        path: &str,
        options: RouteOptions,
        handler: Handler,
    ) -> &mut Self {
        let full = join_prefix(&self.prefix, path);
        let handler = wrap(handler, &self.middleware);
        self.app.route(method, &full, options, handler);
        self
    }
}

/// `/admin` + `/` → `/admin/`, `/admin` + `form` → `/admin/form`.
fn join_prefix(prefix: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", prefix, path)
    } else {
        format!("{}/{}", prefix, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_prefix() {
        assert_eq!(join_prefix("/admin", "/"), "/admin/");
        assert_eq!(join_prefix("/admin", "/form"), "/admin/form");
        assert_eq!(join_prefix("/admin", "form"), "/admin/form");
        assert_eq!(join_prefix("", "/x"), "/x");
    }
}
