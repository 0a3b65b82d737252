//! Push relay — HTTP + WebSocket backend.
//!
//! Optional env: HOST, PORT, STORE_BACKEND, DATABASE_PATH, PUSH_BACKEND,
//! GATEWAY_ENDPOINT, PUSH_TIMEOUT_MS, OUTBOUND_BUFFER, PING_INTERVAL_SECS

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use relay::{api, config, store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = config::Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;
    let config = Arc::new(config);

    let store = store::open_store(&config)?;
    let state = api::AppState::new(config.clone(), store)?;
    state.lifecycle.init().await?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid bind address: {}", e))?;

    tracing::info!(
        push = ?config.push_backend,
        store = ?config.store_backend,
        "relay listening on {}",
        addr
    );
    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}
