mod config;

use anyhow::Result;
use media_axum::MediaAxumApp;
use media_blob::{MediaAdapter, S3Store};
use tracing::{info, warn};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = dotenvy::dotenv() {
        warn!(error = %err, "No .env file loaded, using process environment");
    }

    let config = ServerConfig::from_env()?;
    let store = S3Store::connect(config.storage.clone()).await?;
    let app = MediaAxumApp::new(MediaAdapter::new(store, config.media()));

    let addr = config.addr();
    info!(%addr, bucket = %config.storage.bucket, "Starting media server");

    app.listen(addr, shutdown_signal()).await?;

    info!("Media server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, draining in-flight calls");
}
