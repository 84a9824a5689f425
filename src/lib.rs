//! Server-rendered htmx application layer.
//!
//! Resolves each request to a view and renders it through the viewer the
//! client prefers: JSON, composed HTML templates, or static files, each with
//! per-host overrides.

pub mod assets;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod template;
pub mod view;

pub use config::schema::AppConfig;
pub use error::{Outcome, ViewError};
pub use http::{handler, middleware, App, Context, Group, Handler, HttpServer, Middleware};
pub use lifecycle::Shutdown;
pub use routing::{
    with_navigation, NavigationItem, RouteOptions, NAVIGATION_ACCESS, NAVIGATION_ICON,
    NAVIGATION_LABEL,
};
pub use view::ViewerKind;
