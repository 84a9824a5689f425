//! `Accept-Language` parsing.

use crate::view::negotiate::parse_quality;

/// Language tags from an `Accept-Language` header, most preferred first.
///
/// `q=0` entries and the `*` wildcard are dropped; equal weights keep
/// header order.
pub fn parse_accept_language(header: &str) -> Vec<String> {
    let mut tags: Vec<(String, f32)> = header
        .split(',')
        .filter_map(|item| {
            let mut parts = item.split(';');
            let tag = parts.next()?.trim();
            if tag.is_empty() || tag == "*" {
                return None;
            }
            let quality = parse_quality(parts);
            (quality > 0.0).then(|| (tag.to_string(), quality))
        })
        .collect();

    tags.sort_by(|a, b| b.1.total_cmp(&a.1));
    tags.into_iter().map(|(tag, _)| tag).collect()
}
