//! PriceLab HTTP server.
//!
//! Reads its config from the file named by `PRICELAB_CONFIG` (defaults when
//! unset) and serves the JSON API until Ctrl-C.

mod error;
mod routes;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pricelab_core::{MarketService, PricelabConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;

    // The blocking HTTP client is built and dropped outside the async runtime.
    let service = Arc::new(
        MarketService::from_config(&config).context("failed to build market service")?,
    );

    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    runtime.block_on(serve(service.clone(), &config))?;
    drop(runtime);

    info!("server stopped");
    Ok(())
}

fn load_config() -> Result<PricelabConfig> {
    match std::env::var_os("PRICELAB_CONFIG") {
        Some(path) => {
            let path = PathBuf::from(path);
            let config = PricelabConfig::from_file(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            info!(path = %path.display(), "config loaded");
            Ok(config)
        }
        None => {
            info!("PRICELAB_CONFIG not set, using defaults");
            Ok(PricelabConfig::default())
        }
    }
}

async fn serve(service: Arc<MarketService>, config: &PricelabConfig) -> Result<()> {
    let app = routes::router(
        service,
        Duration::from_secs(config.server.request_timeout_secs),
    );

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    info!(addr = %config.server.bind, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server failed")
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown requested"),
        Err(error) => {
            warn!(%error, "cannot listen for Ctrl-C, running until killed");
            std::future::pending::<()>().await;
        }
    }
}
