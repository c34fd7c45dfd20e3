//! slackmux server: HTTP endpoint for Slack interactivity.
//!
//! Receives `block_actions` and `view_submission` webhooks on a single
//! path and dispatches them through an [`InteractionMux`](slackmux::InteractionMux)
//! populated with the built-in handlers in [`handlers`].

mod config;
mod error;
mod handlers;

use anyhow::Context;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slackmux=info".parse()?)
                .add_directive("slackmux_server=info".parse()?),
        )
        .init();

    // Load configuration
    let config_path = config::default_config_path().context("Failed to determine config path")?;
    let mut server_config = config::ServerConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    server_config.apply_env();

    info!(
        listen = %server_config.listen,
        path = %server_config.path,
        verify_signatures = server_config.signing_secret.is_some(),
        "Configuration loaded successfully"
    );

    // A broken handler table must never serve traffic
    let mux = handlers::build_mux(&server_config).context("Failed to build interaction mux")?;
    let app = mux.into_router(&server_config.path);

    let listener = tokio::net::TcpListener::bind(server_config.listen)
        .await
        .with_context(|| format!("Failed to bind {}", server_config.listen))?;

    info!(addr = %server_config.listen, "Listening for Slack interactions");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("Server shut down cleanly");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(signal) => signal,
                Err(e) => {
                    tracing::warn!(error = %e, "Cannot register SIGTERM handler");
                    ctrl_c.await.ok();
                    info!("Received SIGINT, shutting down...");
                    return;
                }
            };

        tokio::select! {
            _ = ctrl_c => {
                info!("Received SIGINT, shutting down...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received SIGINT, shutting down...");
    }
}
