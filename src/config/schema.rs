//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the app.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::view::ViewerKind;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backing asset tree.
    pub assets: AssetConfig,

    /// View rendering settings.
    pub views: ViewConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request limits.
    pub security: SecurityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Asset tree configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Directory holding `public/`, `pages/`, `views/`, `layouts/`, `components/`.
    pub root: String,

    /// Invalidate cached templates when the directory changes.
    pub watch: bool,
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self {
            root: "./site".to_string(),
            watch: false,
        }
    }
}

/// View rendering configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Keep built template sets between requests.
    pub cache_templates: bool,

    /// Viewer used for every `view` call instead of negotiation.
    pub default_viewer: Option<ViewerKind>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            cache_templates: true,
            default_viewer: None,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [assets]
            root = "/srv/site"

            [views]
            default_viewer = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.assets.root, "/srv/site");
        assert!(!config.assets.watch);
        assert!(config.views.cache_templates);
        assert_eq!(config.views.default_viewer, Some(ViewerKind::Json));
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.timeouts.request_secs, 30);
    }
}
