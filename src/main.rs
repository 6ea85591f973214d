mod core;
mod memory;
mod server;
mod state;

use std::future::IntoFuture;

use anyhow::Context;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = core::config::Config::load()?;
    core::logging::init(&config);

    let state = AppState::new();
    let app = server::router::router(state).layer(TimeoutLayer::new(config.request_timeout));

    let listener = TcpListener::bind(&config.http_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.http_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("listening on {}", addr);

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            })
            .into_future(),
    );

    tokio::select! {
        result = &mut server => {
            return result
                .context("server task failed")?
                .context("server error");
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(());
        }
    }

    // Give in-flight requests a bounded window to finish.
    match tokio::time::timeout(config.shutdown_timeout, server).await {
        Ok(result) => result.context("server task failed")?.context("server error")?,
        Err(_) => tracing::warn!("graceful shutdown timed out"),
    }

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
