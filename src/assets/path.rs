//! Logical path handling for the asset tree.

use crate::error::ViewError;

/// Default document served for directory-like requests.
pub const INDEX_DOCUMENT: &str = "index.html";

/// Prefix marking a host-scoped subtree inside a namespace.
pub const HOST_MARKER: char = '@';

/// A normalized, host-neutral location inside a namespace.
///
/// Segments never contain `/`, `.` or `..`, and the first segment never
/// starts with the host marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    /// Normalize a request path.
    ///
    /// Percent-escapes are decoded, the leading slash is stripped and a
    /// trailing slash (or an empty path) requests the index document.
    pub fn parse(request_path: &str) -> Result<Self, ViewError> {
        let raw = request_path.split(['?', '#']).next().unwrap_or_default();
        let path = urlencoding::decode(raw).map_err(|_| ViewError::NotFound)?;

        let mut segments = Vec::new();
        for segment in path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(ViewError::NotFound),
                s if s.contains('\\') || s.contains('\0') => return Err(ViewError::NotFound),
                s => segments.push(s.to_string()),
            }
        }

        if segments
            .first()
            .is_some_and(|s| s.starts_with(HOST_MARKER))
        {
            return Err(ViewError::NotFound);
        }

        if path.is_empty() || path.ends_with('/') {
            segments.push(INDEX_DOCUMENT.to_string());
        }

        Ok(Self { segments })
    }

    /// Same location with the index document appended.
    pub fn join_index(&self) -> Self {
        let mut segments = self.segments.clone();
        segments.push(INDEX_DOCUMENT.to_string());
        Self { segments }
    }

    pub fn is_index(&self) -> bool {
        self.segments.last().is_some_and(|s| s == INDEX_DOCUMENT)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Slash-joined form, without a leading slash.
    pub fn as_string(&self) -> String {
        self.segments.join("/")
    }

    /// Full source path inside `namespace` for the given host scope.
    pub fn in_scope(&self, namespace: &str, host: &str) -> String {
        scoped_path(namespace, host, &self.as_string())
    }
}

/// `<namespace>/@<host>/<rest>`, or `<namespace>/<rest>` for the default scope.
pub fn scoped_path(namespace: &str, host: &str, rest: &str) -> String {
    if host.is_empty() {
        format!("{}/{}", namespace, rest)
    } else {
        format!("{}/{}{}/{}", namespace, HOST_MARKER, host, rest)
    }
}

/// Split a source path below `namespace` into (host scope, remainder).
///
/// `pages/@abc.com/admin/index.html` → `("abc.com", "admin/index.html")`.
pub fn split_scope<'a>(namespace: &str, path: &'a str) -> Option<(&'a str, &'a str)> {
    let rest = path.strip_prefix(namespace)?.strip_prefix('/')?;
    match rest.strip_prefix(HOST_MARKER) {
        Some(scoped) => {
            let (host, rest) = scoped.split_once('/')?;
            Some((host, rest))
        }
        None => Some(("", rest)),
    }
}
