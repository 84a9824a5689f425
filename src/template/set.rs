//! Per-host template sets and block substitution.
//!
//! # Responsibilities
//! - Collect pages, views, layouts and components for one host scope
//! - Reject broken trees at build time
//! - Render a page: layout text with `content` and component blocks substituted
//!
//! # Design Decisions
//! - Built once, never mutated; a rebuild replaces the whole set
//! - Pages and views keep host and default maps apart so lookup order is explicit
//! - Components are host-neutral

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::path::split_scope;
use crate::assets::source::AssetSource;
use crate::error::ViewError;
use crate::template::parser::{parse, Node, Template};

pub const PAGES_NAMESPACE: &str = "pages";
pub const VIEWS_NAMESPACE: &str = "views";
pub const LAYOUTS_NAMESPACE: &str = "layouts";
pub const COMPONENTS_NAMESPACE: &str = "components";

/// Block name prefix resolved against the component namespace.
const COMPONENT_PREFIX: &str = "components/";
const TEMPLATE_EXTENSION: &str = ".html";

/// Templates of one namespace, split by scope.
#[derive(Debug, Default)]
struct Scoped {
    host: HashMap<String, Arc<Template>>,
    default: HashMap<String, Arc<Template>>,
}

/// Every page, view, layout and component visible to one host scope.
#[derive(Debug)]
pub struct TemplateSet {
    host: String,
    pages: Scoped,
    views: Scoped,
    layouts: HashMap<String, Arc<Template>>,
    components: HashMap<String, Arc<Template>>,
}

impl TemplateSet {
    /// Parse and validate the templates visible to `host` ("" = default scope).
    pub fn build(source: &dyn AssetSource, host: &str) -> Result<Self, ViewError> {
        let pages = load_scoped(source, PAGES_NAMESPACE, host)?;
        let views = load_scoped(source, VIEWS_NAMESPACE, host)?;

        let layouts_scoped = load_scoped(source, LAYOUTS_NAMESPACE, host)?;
        let mut layouts = layouts_scoped.default;
        layouts.extend(layouts_scoped.host);

        let components = load_scoped(source, COMPONENTS_NAMESPACE, "")?.default;

        let set = Self {
            host: host.to_string(),
            pages,
            views,
            layouts,
            components,
        };
        set.validate()?;

        tracing::debug!(
            host = %set.host,
            pages = set.pages.host.len() + set.pages.default.len(),
            views = set.views.host.len() + set.views.default.len(),
            layouts = set.layouts.len(),
            components = set.components.len(),
            "Template set built"
        );
        Ok(set)
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Find a page by logical name.
    ///
    /// Order: `pages/@host`, `views/@host`, `pages`, `views`. Views are only
    /// consulted for explicitly named views.
    pub fn lookup(&self, name: &str, explicit: bool) -> Option<&Arc<Template>> {
        let name = name.trim_matches('/');
        self.pages
            .host
            .get(name)
            .or_else(|| explicit.then(|| self.views.host.get(name)).flatten())
            .or_else(|| self.pages.default.get(name))
            .or_else(|| explicit.then(|| self.views.default.get(name)).flatten())
    }

    /// Render the named page with `data`.
    pub fn render(&self, name: &str, data: &Value, explicit: bool) -> Result<String, ViewError> {
        let page = self
            .lookup(name, explicit)
            .ok_or_else(|| ViewError::ViewNotFound(name.to_string()))?;

        let body = match &page.layout {
            Some(layout) => {
                let layout = self.layouts.get(layout).ok_or_else(|| {
                    ViewError::Configuration(format!("{}: unknown layout \"{}\"", name, layout))
                })?;
                &layout.body
            }
            None => &page.body,
        };

        let mut renderer = Renderer {
            set: self,
            defines: &page.defines,
            data,
            stack: Vec::new(),
        };
        let mut out = String::new();
        renderer.render_nodes(body, &mut out)?;
        Ok(out)
    }

    fn validate(&self) -> Result<(), ViewError> {
        for (name, layout) in &self.layouts {
            if layout.layout.is_some() {
                return Err(ViewError::Configuration(format!(
                    "layouts/{}: a layout cannot declare another layout",
                    name
                )));
            }
            if !layout.defines.is_empty() {
                return Err(ViewError::Configuration(format!(
                    "layouts/{}: define is not allowed in a layout",
                    name
                )));
            }
        }

        for (namespace, scoped) in [(PAGES_NAMESPACE, &self.pages), (VIEWS_NAMESPACE, &self.views)] {
            for (name, page) in scoped.host.iter().chain(scoped.default.iter()) {
                if let Some(layout) = &page.layout {
                    if !self.layouts.contains_key(layout) {
                        return Err(ViewError::Configuration(format!(
                            "{}/{}: unknown layout \"{}\"",
                            namespace, name, layout
                        )));
                    }
                }
            }
        }

        Ok(())
    }
}

struct Renderer<'a> {
    set: &'a TemplateSet,
    defines: &'a HashMap<String, Vec<Node>>,
    data: &'a Value,
    stack: Vec<&'a str>,
}

impl<'a> Renderer<'a> {
    fn render_nodes(&mut self, nodes: &'a [Node], out: &mut String) -> Result<(), ViewError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Value(path) => write_value(out, lookup_value(self.data, path)),
                Node::Block { name, default } => match self.resolve_block(name) {
                    Some(body) => {
                        if self.stack.contains(&name.as_str()) {
                            return Err(ViewError::Configuration(format!(
                                "block \"{}\" includes itself",
                                name
                            )));
                        }
                        self.stack.push(name.as_str());
                        self.render_nodes(body, out)?;
                        self.stack.pop();
                    }
                    None => self.render_nodes(default.as_slice(), out)?,
                },
            }
        }
        Ok(())
    }

    fn resolve_block(&self, name: &str) -> Option<&'a [Node]> {
        let set: &'a TemplateSet = self.set;
        let defines: &'a HashMap<String, Vec<Node>> = self.defines;
        name.strip_prefix(COMPONENT_PREFIX)
            .and_then(|component| set.components.get(component))
            .map(|c| c.body.as_slice())
            .or_else(|| defines.get(name).map(Vec::as_slice))
    }
}

fn load_scoped(source: &dyn AssetSource, namespace: &str, host: &str) -> Result<Scoped, ViewError> {
    let mut scoped = Scoped::default();

    for path in source.files(namespace)? {
        let Some((scope, rest)) = split_scope(namespace, &path) else {
            continue;
        };
        let Some(name) = rest.strip_suffix(TEMPLATE_EXTENSION) else {
            continue;
        };
        let target = if scope.is_empty() {
            &mut scoped.default
        } else if scope == host {
            &mut scoped.host
        } else {
            continue;
        };

        let Some(bytes) = source.read(&path)? else {
            continue;
        };
        let text = std::str::from_utf8(&bytes)
            .map_err(|_| ViewError::Configuration(format!("{}: not valid UTF-8", path)))?;
        target.insert(name.to_string(), Arc::new(parse(&path, text)?));
    }

    Ok(scoped)
}

/// Logical page names below `namespace`, for every host scope.
pub fn template_names(source: &dyn AssetSource, namespace: &str) -> Result<Vec<(String, String)>, ViewError> {
    Ok(source
        .files(namespace)?
        .iter()
        .filter_map(|path| split_scope(namespace, path))
        .filter_map(|(scope, rest)| {
            rest.strip_suffix(TEMPLATE_EXTENSION)
                .map(|name| (scope.to_string(), name.to_string()))
        })
        .collect())
}

fn lookup_value<'v>(data: &'v Value, path: &[String]) -> &'v Value {
    let mut current = data;
    for field in path {
        current = match current {
            Value::Object(map) => map.get(field).unwrap_or(&Value::Null),
            Value::Array(items) => field
                .parse::<usize>()
                .ok()
                .and_then(|i| items.get(i))
                .unwrap_or(&Value::Null),
            _ => &Value::Null,
        };
    }
    current
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => html_escape_into(out, s),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        other => html_escape_into(out, &other.to_string()),
    }
}

fn html_escape_into(out: &mut String, s: &str) {
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
