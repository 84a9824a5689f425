//! Startup orchestration.
//!
//! # Responsibilities
//! - Start the metrics exporter when enabled
//! - Bind the listener and build the app
//! - Serve until a shutdown signal arrives
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listener binds before the asset tree is read

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::AppConfig;
use crate::error::ViewError;
use crate::http::App;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },

    #[error(transparent)]
    View(#[from] ViewError),
}

/// Serve `app` with the configured listener until SIGINT/SIGTERM.
pub async fn start(app: App, config: &AppConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|source| StartupError::Bind {
            address: address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    spawn_signal_listener(shutdown);

    app.run(listener, rx).await?;
    Ok(())
}
