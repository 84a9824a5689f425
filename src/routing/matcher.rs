//! Route pattern matching.
//!
//! # Responsibilities
//! - Parse route patterns: literals, `{name}` parameters, trailing `/` subtrees
//! - Match a request path and extract parameters
//! - Rank patterns so the most specific one wins
//!
//! # Design Decisions
//! - `/admin/` matches the whole subtree (and `/admin` itself)
//! - `/admin/{$}` matches exactly `/admin/`
//! - Path matching is case-sensitive
//! - No regex: segment comparison only
//! - Request segments are percent-decoded before comparison

use std::borrow::Cow;

/// Marker for "exactly this directory" patterns.
const EXACT_DIR: &str = "{$}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    /// `/about`
    Exact,
    /// `/admin/{$}`
    ExactDir,
    /// `/admin/`
    Subtree,
}

/// Extracted path parameters, in pattern order.
pub type Params = Vec<(String, String)>;

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    raw: String,
    segments: Vec<Segment>,
    kind: Kind,
}

impl Pattern {
    pub fn parse(pattern: &str) -> Self {
        let normalized = if pattern.starts_with('/') {
            pattern.to_string()
        } else {
            format!("/{}", pattern)
        };

        let (body, kind) = if let Some(dir) = normalized.strip_suffix(EXACT_DIR) {
            (dir, Kind::ExactDir)
        } else if normalized.ends_with('/') {
            (normalized.as_str(), Kind::Subtree)
        } else {
            (normalized.as_str(), Kind::Exact)
        };

        let segments = body
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix('{').and_then(|p| p.strip_suffix('}')) {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(s.to_string()),
            })
            .collect();

        Self {
            raw: normalized,
            segments,
            kind,
        }
    }

    /// The pattern as registered (with a leading slash).
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Logical path of the route: the pattern without the exact-dir marker.
    ///
    /// `/admin/{$}` → `/admin/`, `/about` → `/about`.
    pub fn logical_path(&self) -> &str {
        self.raw.strip_suffix(EXACT_DIR).unwrap_or(&self.raw)
    }

    /// Match a request path, returning parameters on success.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let trailing = path.ends_with('/');
        let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let count_ok = match self.kind {
            Kind::Exact => parts.len() == self.segments.len() && (!trailing || parts.is_empty()),
            Kind::ExactDir => parts.len() == self.segments.len() && (trailing || parts.is_empty()),
            Kind::Subtree => parts.len() >= self.segments.len(),
        };
        if !count_ok {
            return None;
        }
        // `/` as an exact pattern only matches the root
        if self.kind == Kind::Exact && self.segments.is_empty() && !parts.is_empty() {
            return None;
        }

        let mut params = Vec::new();
        for (segment, part) in self.segments.iter().zip(&parts) {
            let value = decode_segment(part);
            match segment {
                Segment::Literal(lit) if *lit == value => {}
                Segment::Literal(_) => return None,
                Segment::Param(name) => params.push((name.clone(), value.into_owned())),
            }
        }
        Some(params)
    }

    /// Ranking key: exact beats subtree, longer beats shorter, literals beat params.
    pub fn specificity(&self) -> (u8, usize, usize) {
        let class = match self.kind {
            Kind::Exact | Kind::ExactDir => 1,
            Kind::Subtree => 0,
        };
        let literals = self
            .segments
            .iter()
            .filter(|s| matches!(s, Segment::Literal(_)))
            .count();
        (class, self.segments.len(), literals)
    }
}

fn decode_segment(part: &str) -> Cow<'_, str> {
    urlencoding::decode(part).unwrap_or(Cow::Borrowed(part))
}
