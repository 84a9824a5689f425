//! `Accept` header negotiation.
//!
//! Negotiation is a pure function of the header: it yields the ordered chain
//! of viewers to try. Whether a viewer actually has content for the view name
//! is decided afterwards by the registry.

use crate::view::viewer::ViewerKind;

const JSON_CHAIN: &[ViewerKind] = &[ViewerKind::Json];
const HTML_CHAIN: &[ViewerKind] = &[ViewerKind::Html, ViewerKind::Static, ViewerKind::Json];

/// One parsed media range.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaRange {
    pub essence: String,
    pub quality: f32,
}

/// Parse an `Accept` header into media ranges, most preferred first.
///
/// Ranges with `q=0` are dropped; equal weights keep header order.
pub fn parse_accept(header: &str) -> Vec<MediaRange> {
    let mut ranges: Vec<MediaRange> = header
        .split(',')
        .filter_map(|item| {
            let mut parts = item.split(';');
            let essence = parts.next()?.trim().to_ascii_lowercase();
            if essence.is_empty() {
                return None;
            }
            let quality = parse_quality(parts);
            (quality > 0.0).then_some(MediaRange { essence, quality })
        })
        .collect();

    ranges.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    ranges
}

/// Parse the `q` parameter from `;`-separated parameters (default 1.0).
pub(crate) fn parse_quality<'a>(params: impl Iterator<Item = &'a str>) -> f32 {
    for param in params {
        if let Some((key, value)) = param.split_once('=') {
            if key.trim().eq_ignore_ascii_case("q") {
                return value.trim().parse::<f32>().unwrap_or(0.0).clamp(0.0, 1.0);
            }
        }
    }
    1.0
}

/// Viewers to try, in order, for the given `Accept` header.
///
/// JSON-compatible preferences, `*/*` and a missing header all pick JSON.
/// An HTML preference tries templates, then static files, then JSON.
pub fn negotiate(accept: Option<&str>) -> &'static [ViewerKind] {
    let Some(header) = accept else {
        return JSON_CHAIN;
    };

    for range in parse_accept(header) {
        match range.essence.as_str() {
            "text/html" | "application/xhtml+xml" | "text/*" => return HTML_CHAIN,
            "application/json" | "application/*" | "*/*" => return JSON_CHAIN,
            essence if essence.ends_with("+json") => return JSON_CHAIN,
            _ => continue,
        }
    }

    JSON_CHAIN
}
