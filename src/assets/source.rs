//! Backing content trees.
//!
//! # Responsibilities
//! - Read a file by slash-separated logical path
//! - Enumerate every file below a namespace (`public`, `pages`, ...)
//!
//! # Design Decisions
//! - `Ok(None)` means "no such file"; a directory is not a file
//! - An empty file is `Some` of zero bytes, never `None`
//! - Sources are read-only and shared via `Arc` across requests

use axum::body::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A read-only hierarchical byte-content tree.
pub trait AssetSource: Send + Sync + fmt::Debug {
    /// Read the file at `path`. Returns `Ok(None)` when absent or a directory.
    fn read(&self, path: &str) -> io::Result<Option<Bytes>>;

    /// List every file path below `prefix` (full logical paths, sorted).
    fn files(&self, prefix: &str) -> io::Result<Vec<String>>;

    /// On-disk location, if the tree is backed by a live directory.
    fn root(&self) -> Option<&Path> {
        None
    }
}

/// Live filesystem tree rooted at a directory.
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a logical path below the root; `None` for segments that could leave it.
    fn local_path(&self, path: &str) -> Option<PathBuf> {
        let mut local = self.root.clone();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." || segment.contains('\\') {
                return None;
            }
            local.push(segment);
        }
        Some(local)
    }
}

impl AssetSource for DirSource {
    fn read(&self, path: &str) -> io::Result<Option<Bytes>> {
        let Some(local) = self.local_path(path) else {
            tracing::warn!(path = %path, "Rejected asset path outside the root");
            return Ok(None);
        };
        match fs::metadata(&local) {
            Ok(meta) if meta.is_file() => fs::read(&local).map(|data| Some(Bytes::from(data))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn files(&self, prefix: &str) -> io::Result<Vec<String>> {
        let Some(base) = self.local_path(prefix) else {
            return Ok(Vec::new());
        };
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(&base).follow_links(true) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let logical: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            found.push(logical.join("/"));
        }
        found.sort();
        Ok(found)
    }

    fn root(&self) -> Option<&Path> {
        Some(&self.root)
    }
}

/// In-memory tree, for embedded content and tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    files: BTreeMap<String, Bytes>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file.
    pub fn with_file(mut self, path: &str, data: impl Into<Bytes>) -> Self {
        self.insert(path, data);
        self
    }

    pub fn insert(&mut self, path: &str, data: impl Into<Bytes>) {
        self.files
            .insert(path.trim_start_matches('/').to_string(), data.into());
    }
}

impl<K: AsRef<str>, V: Into<Bytes>> FromIterator<(K, V)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut source = MemorySource::new();
        for (path, data) in iter {
            source.insert(path.as_ref(), data);
        }
        source
    }
}

impl AssetSource for MemorySource {
    fn read(&self, path: &str) -> io::Result<Option<Bytes>> {
        Ok(self.files.get(path.trim_start_matches('/')).cloned())
    }

    fn files(&self, prefix: &str) -> io::Result<Vec<String>> {
        let dir = format!("{}/", prefix.trim_matches('/'));
        Ok(self
            .files
            .keys()
            .filter(|k| k.starts_with(&dir))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_distinguishes_empty_from_missing() {
        let source = MemorySource::new()
            .with_file("public/assets/empty.js", "")
            .with_file("public/index.html", "<p>hi</p>");

        assert_eq!(source.read("public/assets/empty.js").unwrap(), Some(Bytes::new()));
        assert!(source.read("public/assets/missing.js").unwrap().is_none());
        // Directories are not files
        assert!(source.read("public/assets").unwrap().is_none());
    }

    #[test]
    fn test_memory_source_lists_namespace() {
        let source: MemorySource = [
            ("pages/index.html", "a"),
            ("pages/@abc.com/index.html", "b"),
            ("pagesx/other.html", "c"),
            ("public/skin.css", "d"),
        ]
        .into_iter()
        .collect();

        let files = source.files("pages").unwrap();
        assert_eq!(files, vec!["pages/@abc.com/index.html", "pages/index.html"]);
    }

    #[test]
    fn test_dir_source_reads_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("public/admin")).unwrap();
        fs::write(dir.path().join("public/admin/index.html"), "admin").unwrap();
        fs::write(dir.path().join("public/empty.js"), "").unwrap();

        let source = DirSource::new(dir.path());
        assert_eq!(
            source.read("public/admin/index.html").unwrap(),
            Some(Bytes::from_static(b"admin"))
        );
        assert_eq!(source.read("public/empty.js").unwrap(), Some(Bytes::new()));
        assert!(source.read("public/admin").unwrap().is_none());
        assert!(source.read("public/nope.html").unwrap().is_none());

        let files = source.files("public").unwrap();
        assert_eq!(files, vec!["public/admin/index.html", "public/empty.js"]);
        assert!(source.files("pages").unwrap().is_empty());
    }

    #[test]
    fn test_dir_source_stays_under_root() {
        let outer = tempfile::tempdir().unwrap();
        fs::write(outer.path().join("secret.txt"), "secret").unwrap();
        fs::create_dir_all(outer.path().join("site/public")).unwrap();

        let source = DirSource::new(outer.path().join("site"));
        assert!(source.read("public/../../secret.txt").unwrap().is_none());
        assert!(source.read("public/./../../secret.txt").unwrap().is_none());
        assert!(source.read("public\\..\\..\\secret.txt").unwrap().is_none());
        assert!(source.files("..").unwrap().is_empty());
    }
}
