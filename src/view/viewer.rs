//! Viewer variants and the registry that picks one per request.
//!
//! # Responsibilities
//! - JSON viewer: serialize view data
//! - HTML viewer: compose a page through the template composer
//! - Static viewer: serve a raw file through the asset store
//! - Registry: walk the negotiated chain and render with the first viewer
//!   that has content for the view name
//!
//! # Design Decisions
//! - Closed set of variants; no shared base state
//! - JSON can always render, so it is the universal last resort

use axum::body::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::assets::store::AssetStore;
use crate::error::ViewError;
use crate::template::TemplateComposer;
use crate::view::negotiate::negotiate;

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Viewer identity, also usable to pin a viewer from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerKind {
    Json,
    Html,
    Static,
}

impl ViewerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewerKind::Json => "json",
            ViewerKind::Html => "html",
            ViewerKind::Static => "static",
        }
    }
}

impl fmt::Display for ViewerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a viewer is asked to render.
#[derive(Debug, Clone, Copy)]
pub struct ViewRequest<'a> {
    /// Host scope ("" = default).
    pub host: &'a str,
    /// Logical view name (or request path for static routes).
    pub name: &'a str,
    /// Named by the handler rather than derived from the route.
    pub explicit: bool,
    pub data: &'a Value,
}

/// A finished response body.
#[derive(Debug, Clone)]
pub struct Rendered {
    pub viewer: ViewerKind,
    pub content_type: &'static str,
    pub body: Bytes,
}

/// Capability shared by every viewer.
pub trait Render {
    /// Whether this viewer has something to render for the request.
    fn can_render(&self, req: &ViewRequest<'_>) -> Result<bool, ViewError>;

    fn render(&self, req: &ViewRequest<'_>) -> Result<Rendered, ViewError>;
}

#[derive(Debug, Clone, Default)]
pub struct JsonViewer;

impl Render for JsonViewer {
    fn can_render(&self, _req: &ViewRequest<'_>) -> Result<bool, ViewError> {
        Ok(true)
    }

    fn render(&self, req: &ViewRequest<'_>) -> Result<Rendered, ViewError> {
        Ok(Rendered {
            viewer: ViewerKind::Json,
            content_type: JSON_CONTENT_TYPE,
            body: Bytes::from(serde_json::to_vec(req.data)?),
        })
    }
}

#[derive(Debug, Clone)]
pub struct HtmlViewer {
    composer: Arc<TemplateComposer>,
}

impl HtmlViewer {
    pub fn new(composer: Arc<TemplateComposer>) -> Self {
        Self { composer }
    }
}

impl Render for HtmlViewer {
    fn can_render(&self, req: &ViewRequest<'_>) -> Result<bool, ViewError> {
        self.composer.has_view(req.host, req.name, req.explicit)
    }

    fn render(&self, req: &ViewRequest<'_>) -> Result<Rendered, ViewError> {
        let html = self
            .composer
            .render(req.host, req.name, req.data, req.explicit)?;
        Ok(Rendered {
            viewer: ViewerKind::Html,
            content_type: HTML_CONTENT_TYPE,
            body: Bytes::from(html),
        })
    }
}

#[derive(Debug, Clone)]
pub struct StaticViewer {
    store: AssetStore,
}

impl StaticViewer {
    pub fn new(store: AssetStore) -> Self {
        Self { store }
    }

    /// Resolve a view name (or request path) to a file: the name itself,
    /// its directory index, then `<name>.html`.
    fn resolve(&self, req: &ViewRequest<'_>) -> Result<crate::assets::Asset, ViewError> {
        match self.store.resolve(req.host, req.name) {
            Err(ViewError::NotFound) if !req.name.ends_with('/') && !has_extension(req.name) => {
                self.store.resolve(req.host, &format!("{}.html", req.name))
            }
            other => other,
        }
    }
}

fn has_extension(name: &str) -> bool {
    name.rsplit('/').next().is_some_and(|last| last.contains('.'))
}

impl Render for StaticViewer {
    fn can_render(&self, req: &ViewRequest<'_>) -> Result<bool, ViewError> {
        match self.resolve(req) {
            Ok(_) => Ok(true),
            Err(ViewError::NotFound) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn render(&self, req: &ViewRequest<'_>) -> Result<Rendered, ViewError> {
        let asset = self.resolve(req)?;
        Ok(Rendered {
            viewer: ViewerKind::Static,
            content_type: asset.content_type,
            body: asset.bytes,
        })
    }
}

/// The closed set of viewers available to an app.
#[derive(Debug, Clone)]
pub struct ViewerRegistry {
    json: JsonViewer,
    html: HtmlViewer,
    static_files: StaticViewer,
}

impl ViewerRegistry {
    pub fn new(composer: Arc<TemplateComposer>, store: AssetStore) -> Self {
        Self {
            json: JsonViewer,
            html: HtmlViewer::new(composer),
            static_files: StaticViewer::new(store),
        }
    }

    pub fn get(&self, kind: ViewerKind) -> &dyn Render {
        match kind {
            ViewerKind::Json => &self.json,
            ViewerKind::Html => &self.html,
            ViewerKind::Static => &self.static_files,
        }
    }

    /// Negotiate and render.
    ///
    /// A pinned viewer is used unconditionally; otherwise the chain derived
    /// from `accept` is walked until a viewer has content for the view.
    pub fn render(
        &self,
        req: &ViewRequest<'_>,
        accept: Option<&str>,
        pinned: Option<ViewerKind>,
    ) -> Result<Rendered, ViewError> {
        let pinned_chain;
        let chain: &[ViewerKind] = match pinned {
            Some(kind) => {
                pinned_chain = [kind];
                &pinned_chain
            }
            None => negotiate(accept),
        };

        for kind in chain {
            let viewer = self.get(*kind);
            if pinned.is_some() || viewer.can_render(req)? {
                tracing::debug!(view = %req.name, host = %req.host, viewer = %kind, "Viewer selected");
                return viewer.render(req).map_err(|e| match e {
                    ViewError::NotFound => ViewError::ViewNotFound(req.name.to_string()),
                    other => other,
                });
            }
        }

        Err(ViewError::ViewNotFound(req.name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::source::MemorySource;
    use serde_json::json;

    fn registry() -> ViewerRegistry {
        let source = Arc::new(
            MemorySource::new()
                .with_file("pages/list.html", "list")
                .with_file("views/user.html", "user")
                .with_file("public/about.html", "about page")
                .with_file("public/assets/skin.css", "body {}"),
        );
        let composer = Arc::new(TemplateComposer::new(source.clone(), true));
        ViewerRegistry::new(composer, AssetStore::new(source))
    }

    fn request<'a>(name: &'a str, data: &'a Value) -> ViewRequest<'a> {
        ViewRequest {
            host: "",
            name,
            explicit: false,
            data,
        }
    }

    #[test]
    fn test_html_then_static_then_json() {
        let registry = registry();
        let data = json!({"name": "list"});
        let html = Some("text/html, */*");

        let out = registry.render(&request("list", &data), html, None).unwrap();
        assert_eq!(out.viewer, ViewerKind::Html);
        assert_eq!(out.body, "list");

        let out = registry.render(&request("about", &data), html, None).unwrap();
        assert_eq!(out.viewer, ViewerKind::Static);
        assert_eq!(out.body, "about page");

        let out = registry.render(&request("nothing", &data), html, None).unwrap();
        assert_eq!(out.viewer, ViewerKind::Json);
        assert_eq!(out.content_type, JSON_CONTENT_TYPE);
    }

    #[test]
    fn test_json_accept() {
        let data = json!({"method": "GET", "num": 1});
        let out = registry()
            .render(&request("list", &data), Some("application/json"), None)
            .unwrap();
        assert_eq!(out.viewer, ViewerKind::Json);
        let parsed: Value = serde_json::from_slice(&out.body).unwrap();
        assert_eq!(parsed, data);
    }

    #[test]
    fn test_pinned_viewer_is_unconditional() {
        let registry = registry();
        let data = Value::Null;

        let out = registry
            .render(&request("list", &data), Some("text/html"), Some(ViewerKind::Json))
            .unwrap();
        assert_eq!(out.body, "null");

        let err = registry
            .render(&request("missing", &data), None, Some(ViewerKind::Html))
            .unwrap_err();
        assert!(matches!(err, ViewError::ViewNotFound(_)));

        let err = registry
            .render(&request("/missing.css", &data), None, Some(ViewerKind::Static))
            .unwrap_err();
        assert!(matches!(err, ViewError::ViewNotFound(_)));
    }

    #[test]
    fn test_static_asset_content_type() {
        let out = registry()
            .render(&request("/assets/skin.css", &Value::Null), None, Some(ViewerKind::Static))
            .unwrap();
        assert_eq!(out.content_type, "text/css; charset=utf-8");
    }

    #[test]
    fn test_views_need_explicit_name() {
        let registry = registry();
        let html = Some("text/html");
        let data = Value::Null;

        let derived = registry.render(&request("user", &data), html, None).unwrap();
        assert_eq!(derived.viewer, ViewerKind::Json);

        let mut named = request("user", &data);
        named.explicit = true;
        let out = registry.render(&named, html, None).unwrap();
        assert_eq!(out.viewer, ViewerKind::Html);
        assert_eq!(out.body, "user");
    }
}
