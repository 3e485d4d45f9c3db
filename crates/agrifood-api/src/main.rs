//! agri-food API server.
//!
//! - `GET /products`, `GET /error`: instrumented routes
//! - `GET /health`, `GET /metrics`: operational routes
//! - Port from `PORT` (default 8080), optional YAML file from `AGRIFOOD_CONFIG`

use tracing_subscriber::{fmt, EnvFilter};

use agrifood_api::{app_state, config, router};
use agrifood_core::error::{AgriFoodError, Result};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "agri-food-api failed");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cfg = config::load_from_env()?;
    let listen = cfg.listen_addr()?;

    let state = app_state::AppState::new(&cfg)?;
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| AgriFoodError::Internal(format!("bind {listen} failed: {e}")))?;
    tracing::info!(port = listen.port(), %listen, "agri-food-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AgriFoodError::Internal(format!("server failed: {e}")))?;

    tracing::info!("agri-food-api stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "ctrl-c handler unavailable");
        std::future::pending::<()>().await;
    }
}
