//! htmx-app server binary.
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ route table ──▶ handler
//!                                                       │ ctx.view(data)
//!                                                       ▼
//!                                          viewer registry (Accept)
//!                                     ┌─────────┬───────┴───┬─────────┐
//!                                     │  json   │   html    │  static │
//!                                     │         │ templates │  assets │
//!                                     └─────────┴─────┬─────┴────┬────┘
//!                                                     └── asset tree (per-host @overrides)
//! ```
//!
//! Every `pages/` template and `public/` file is routed automatically.

use clap::Parser;
use std::path::PathBuf;

use htmx_app::config::validation::validate_config;
use htmx_app::config::{load_config, AppConfig, ConfigError};
use htmx_app::lifecycle;
use htmx_app::observability::logging;
use htmx_app::App;

#[derive(Parser)]
#[command(name = "htmx-app")]
#[command(about = "Serve pages, views and static assets with per-host overrides", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Asset tree root (overrides `assets.root`).
    #[arg(short, long)]
    root: Option<String>,

    /// Bind address (overrides `listener.bind_address`).
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(root) = cli.root {
        config.assets.root = root;
    }
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        root = %config.assets.root,
        request_timeout_secs = config.timeouts.request_secs,
        "htmx-app starting"
    );

    let app = App::new(config.clone());
    lifecycle::start(app, &config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
