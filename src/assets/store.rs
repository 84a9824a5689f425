//! Host-scoped asset lookup.
//!
//! # Responsibilities
//! - Resolve `(host, request path)` to a byte-exact file under `public/`
//! - Apply host-override precedence and the directory index rule
//!
//! # Design Decisions
//! - Candidate order: `@host/path`, `@host/path/index.html`, `path`, `path/index.html`
//! - Nothing is cached: what a client sees always matches the backing tree

use axum::body::Bytes;
use std::sync::Arc;

use crate::assets::content_type::guess_content_type;
use crate::assets::path::VirtualPath;
use crate::assets::source::AssetSource;
use crate::error::ViewError;

/// Namespace holding static assets and bare HTML.
pub const PUBLIC_NAMESPACE: &str = "public";

/// A resolved static file.
#[derive(Debug, Clone)]
pub struct Asset {
    /// Source path the bytes were read from.
    pub path: String,
    pub content_type: &'static str,
    pub bytes: Bytes,
}

/// Byte-exact file lookup with host-scoped overrides.
#[derive(Debug, Clone)]
pub struct AssetStore {
    source: Arc<dyn AssetSource>,
    namespace: String,
}

impl AssetStore {
    pub fn new(source: Arc<dyn AssetSource>) -> Self {
        Self {
            source,
            namespace: PUBLIC_NAMESPACE.to_string(),
        }
    }

    /// Resolve a request path for the given host scope.
    pub fn resolve(&self, host: &str, request_path: &str) -> Result<Asset, ViewError> {
        let path = VirtualPath::parse(request_path)?;
        self.resolve_path(host, &path)
    }

    /// Resolve an already-normalized path.
    pub fn resolve_path(&self, host: &str, path: &VirtualPath) -> Result<Asset, ViewError> {
        let candidates = [host, ""];
        let scopes = if host.is_empty() { &candidates[1..] } else { &candidates[..] };

        for scope in scopes {
            if let Some(asset) = self.lookup(scope, path)? {
                tracing::trace!(host = %host, path = %asset.path, "Asset resolved");
                return Ok(asset);
            }
            if !path.is_index() {
                if let Some(asset) = self.lookup(scope, &path.join_index())? {
                    tracing::trace!(host = %host, path = %asset.path, "Asset resolved as directory index");
                    return Ok(asset);
                }
            }
        }

        Err(ViewError::NotFound)
    }

    /// Every file below the namespace, as (host scope, remainder) pairs.
    pub fn entries(&self) -> Result<Vec<(String, String)>, ViewError> {
        let files = self.source.files(&self.namespace)?;
        Ok(files
            .iter()
            .filter_map(|f| crate::assets::path::split_scope(&self.namespace, f))
            .map(|(host, rest)| (host.to_string(), rest.to_string()))
            .collect())
    }

    fn lookup(&self, host: &str, path: &VirtualPath) -> Result<Option<Asset>, ViewError> {
        let full = path.in_scope(&self.namespace, host);
        Ok(self.source.read(&full)?.map(|bytes| Asset {
            content_type: guess_content_type(&full),
            path: full,
            bytes,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::source::MemorySource;

    fn store() -> AssetStore {
        let source: MemorySource = [
            ("public/index.html", "index"),
            ("public/home.html", "home"),
            ("public/admin/index.html", "admin/index"),
            ("public/assets/skin.css", "body {}"),
            ("public/assets/empty.js", ""),
            ("public/@abc.com/index.html", "abc.com/index"),
            ("public/@abc.com/admin/index.html", "abc.com/admin"),
        ]
        .into_iter()
        .collect();
        AssetStore::new(Arc::new(source))
    }

    #[test]
    fn test_default_scope() {
        let store = store();
        assert_eq!(store.resolve("", "/").unwrap().bytes, "index");
        assert_eq!(store.resolve("", "/home.html").unwrap().bytes, "home");
        assert_eq!(store.resolve("", "/admin").unwrap().bytes, "admin/index");
        assert_eq!(store.resolve("", "/admin/").unwrap().bytes, "admin/index");

        let css = store.resolve("", "/assets/skin.css").unwrap();
        assert_eq!(css.content_type, "text/css; charset=utf-8");
    }

    #[test]
    fn test_empty_file_is_found() {
        let asset = store().resolve("", "/assets/empty.js").unwrap();
        assert!(asset.bytes.is_empty());
        assert!(matches!(
            store().resolve("", "/assets/missing.js"),
            Err(ViewError::NotFound)
        ));
    }

    #[test]
    fn test_host_override_precedence() {
        let store = store();
        assert_eq!(store.resolve("abc.com", "/").unwrap().bytes, "abc.com/index");
        assert_eq!(store.resolve("abc.com", "/admin").unwrap().bytes, "abc.com/admin");
        assert_eq!(store.resolve("abc.com", "/admin/").unwrap().bytes, "abc.com/admin");
        // Falls back to the default subtree
        assert_eq!(store.resolve("abc.com", "/home.html").unwrap().bytes, "home");
        // Other hosts never see the override
        assert_eq!(store.resolve("xyz.com", "/").unwrap().bytes, "index");
    }

    #[test]
    fn test_host_subtree_not_directly_addressable() {
        assert!(store().resolve("", "/@abc.com/index.html").is_err());
    }

    #[test]
    fn test_entries() {
        let entries = store().entries().unwrap();
        assert!(entries.contains(&("abc.com".to_string(), "admin/index.html".to_string())));
        assert!(entries.contains(&(String::new(), "assets/empty.js".to_string())));
    }
}
