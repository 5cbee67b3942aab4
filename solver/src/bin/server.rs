use anyhow::{Context, Result};
use tracing::info;

use crossprob::server::{create_router, ServerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    crossprob::env_config::init_tracing();
    let port = crossprob::env_config::server_port();
    let max_n = crossprob::env_config::max_request_n();
    info!(port, max_n, "starting crossprob API server");

    let app = create_router(ServerConfig { max_n });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("binding port {port}"))?;
    info!("Server is running on port {}. Press Ctrl+C to stop.", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Stopping server...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install CTRL+C signal handler");
        std::future::pending::<()>().await;
    }
}
