//! Viewer registry and content negotiation.
//!
//! # Data Flow
//! ```text
//! Context::view(data, name?)
//!     → negotiate.rs (Accept → ordered viewer chain, or pinned viewer)
//!     → viewer.rs (first viewer with content for the view name renders)
//!     → Rendered (content type + bytes) written once to the response
//! ```

pub mod negotiate;
pub mod viewer;

pub use negotiate::negotiate;
pub use viewer::{
    HtmlViewer, JsonViewer, Render, Rendered, StaticViewer, ViewRequest, ViewerKind,
    ViewerRegistry, HTML_CONTENT_TYPE, JSON_CONTENT_TYPE,
};
