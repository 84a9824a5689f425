//! Request inspection helpers.
//!
//! # Responsibilities
//! - Derive the host scope from `Host` (or the URI authority)
//! - Read the request ID attached by the middleware stack
//!
//! # Design Decisions
//! - Host scope is lowercase, without port or trailing dot
//! - Request ID added as early as possible for tracing

use axum::http::{header, request::Parts, HeaderName};

/// Header carrying the per-request identifier.
pub static X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Host scope of a request ("" when no usable host is present).
pub fn host_scope(parts: &Parts) -> String {
    let raw = parts
        .headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .or_else(|| parts.uri.authority().map(|a| a.as_str()))
        .unwrap_or_default();
    normalize_host(raw)
}

/// Lowercase a host and strip port, userinfo and trailing dot.
///
/// Anything that is not a plain hostname or a bracketed IPv6 literal maps to
/// the default scope.
pub fn normalize_host(raw: &str) -> String {
    let raw = raw.trim();
    let raw = raw.rsplit_once('@').map_or(raw, |(_, h)| h);

    let host = if raw.starts_with('[') {
        // IPv6 literal: keep the brackets, drop the port
        match raw.find(']') {
            Some(end) => &raw[..=end],
            None => raw,
        }
    } else {
        raw.split(':').next().unwrap_or_default()
    };

    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if is_valid_host(&host) {
        host
    } else {
        String::new()
    }
}

fn is_valid_host(host: &str) -> bool {
    if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        return !inner.is_empty() && inner.chars().all(|c| c.is_ascii_hexdigit() || c == ':' || c == '.');
    }
    !host.is_empty()
        && host
            .split('.')
            .all(|label| !label.is_empty() && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-'))
}

/// Request ID set by `SetRequestIdLayer`, if any.
pub fn request_id(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(&X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
}
