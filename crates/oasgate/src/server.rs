//! HTTP server.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use oasgate_telemetry::{log_listening, log_shutdown};
use tokio::net::TcpListener;

use crate::api::{create_router, AppState};

/// Server configuration.
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub request_timeout: Duration,
    pub state: AppState,
}

/// Run the server until a shutdown signal arrives.
pub async fn run(config: ServerConfig) -> anyhow::Result<()> {
    let app = create_router(config.state, config.request_timeout);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.listen_addr))?;
    log_listening!(addr = %config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    log_shutdown!(addr = %config.listen_addr);
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
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
}
