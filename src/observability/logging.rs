//! Structured logging setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the global subscriber.
///
/// `RUST_LOG` wins over the configured level.
pub fn init_logging(log_level: &str) {
    let default_filter = format!("htmx_app={},tower_http={}", log_level, log_level);

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
