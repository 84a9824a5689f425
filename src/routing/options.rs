//! Per-route metadata.
//!
//! Options are attached when a route is registered and never change
//! afterwards. Handlers and middleware read them through the request
//! context, e.g. to gate a group on an access token.

use serde::Serialize;
use std::collections::BTreeMap;

pub const NAVIGATION_LABEL: &str = "navigation.label";
pub const NAVIGATION_ICON: &str = "navigation.icon";
pub const NAVIGATION_ACCESS: &str = "navigation.access";

/// Immutable key → value bag attached to a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOptions {
    values: BTreeMap<String, String>,
}

impl RouteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Combine two bags; entries in `other` win.
    pub fn merge(mut self, other: RouteOptions) -> Self {
        self.values.extend(other.values);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Value for `key`, or `""` when unset.
    pub fn string(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Options declaring a navigation entry: label, icon class, access token.
pub fn with_navigation(label: &str, icon: &str, access: &str) -> RouteOptions {
    RouteOptions::new()
        .with(NAVIGATION_LABEL, label)
        .with(NAVIGATION_ICON, icon)
        .with(NAVIGATION_ACCESS, access)
}

/// A menu entry derived from route options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavigationItem {
    pub path: String,
    pub label: String,
    pub icon: String,
    pub access: String,
}

impl NavigationItem {
    /// Build an item if the options carry a navigation label.
    pub fn from_options(path: &str, options: &RouteOptions) -> Option<Self> {
        let label = options.get(NAVIGATION_LABEL)?;
        Some(Self {
            path: path.to_string(),
            label: label.to_string(),
            icon: options.string(NAVIGATION_ICON).to_string(),
            access: options.string(NAVIGATION_ACCESS).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_options() {
        let options = with_navigation("admin", "fa fa-home", "admin:*");
        assert_eq!(options.string(NAVIGATION_ACCESS), "admin:*");
        assert_eq!(options.string("missing"), "");

        let item = NavigationItem::from_options("/admin/", &options).unwrap();
        assert_eq!(item.label, "admin");
        assert_eq!(item.icon, "fa fa-home");
        assert!(NavigationItem::from_options("/x", &RouteOptions::new()).is_none());
    }

    #[test]
    fn test_merge_prefers_later() {
        let merged = RouteOptions::new()
            .with("a", "1")
            .with("b", "1")
            .merge(RouteOptions::new().with("b", "2"));
        assert_eq!(merged.get("a"), Some("1"));
        assert_eq!(merged.get("b"), Some("2"));
    }
}
