//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Store registered and auto-registered routes
//! - Look up the most specific route for (method, path)
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after the app is built (shared via `Arc`, no locks)
//! - O(n) scan over routes (acceptable for typical route counts)
//! - Ties go to registered routes, then to the earliest registration

use axum::http::Method;
use std::sync::Arc;

use crate::http::handler::Handler;
use crate::routing::matcher::{Params, Pattern};
use crate::routing::options::{NavigationItem, RouteOptions};

/// Where a route came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RouteOrigin {
    /// Generated from a `public/` file.
    Static,
    /// Generated from a `pages/` template.
    Page,
    /// Registered by application code.
    Registered,
}

impl RouteOrigin {
    fn rank(self) -> u8 {
        match self {
            RouteOrigin::Static | RouteOrigin::Page => 0,
            RouteOrigin::Registered => 1,
        }
    }
}

/// The facts a matched route hands to the request context.
#[derive(Debug)]
pub struct RouteInfo {
    pub pattern: Pattern,
    pub options: RouteOptions,
    pub origin: RouteOrigin,
}

impl RouteInfo {
    /// Default view name derived from the route's logical path.
    ///
    /// `/admin/` → `admin/index`, `/about` → `about`, `/` → `index`.
    pub fn default_view_name(&self) -> String {
        let path = self.pattern.logical_path().trim_start_matches('/');
        if path.is_empty() {
            "index".to_string()
        } else if let Some(dir) = path.strip_suffix('/') {
            format!("{}/index", dir)
        } else {
            path.to_string()
        }
    }
}

/// A single routing entry.
#[derive(Clone)]
pub struct Route {
    /// `None` matches every method.
    pub method: Option<Method>,
    pub info: Arc<RouteInfo>,
    pub handler: Handler,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("pattern", &self.info.pattern.as_str())
            .field("origin", &self.info.origin)
            .finish()
    }
}

impl Route {
    fn accepts(&self, method: &Method) -> bool {
        match &self.method {
            None => true,
            Some(m) => m == method || (*m == Method::GET && *method == Method::HEAD),
        }
    }
}

/// Route table.
#[derive(Debug, Default, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, route: Route) {
        tracing::debug!(
            method = ?route.method,
            pattern = %route.info.pattern.as_str(),
            origin = ?route.info.origin,
            "Route registered"
        );
        self.routes.push(route);
    }

    /// Whether a route with exactly this method and pattern exists.
    pub fn contains(&self, method: Option<&Method>, pattern: &str) -> bool {
        self.routes
            .iter()
            .any(|r| r.method.as_ref() == method && r.info.pattern.as_str() == pattern)
    }

    /// Find the best route for the request.
    pub fn find(&self, method: &Method, path: &str) -> Option<(&Route, Params)> {
        let mut best: Option<(&Route, Params, ((u8, usize, usize), u8))> = None;

        for route in self.routes.iter().filter(|r| r.accepts(method)) {
            let Some(params) = route.info.pattern.matches(path) else {
                continue;
            };
            let score = (route.info.pattern.specificity(), route.info.origin.rank());
            if best.as_ref().map_or(true, |(_, _, s)| score > *s) {
                best = Some((route, params, score));
            }
        }

        best.map(|(route, params, _)| (route, params))
    }

    /// Navigation entries of every route carrying a navigation label.
    pub fn navigation(&self) -> Vec<NavigationItem> {
        self.routes
            .iter()
            .filter_map(|r| NavigationItem::from_options(r.info.pattern.logical_path(), &r.info.options))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
