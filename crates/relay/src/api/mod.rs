//! HTTP and WebSocket surface.

mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::dispatch::BroadcastDispatcher;
use crate::error::RelayResult;
use crate::lifecycle::LifecycleHandler;
use crate::push::{open_push, LocalPush};
use crate::store::ConnectionStore;

pub use routes::CONNECTION_ID_HEADER;

/// Shared app state, built once per process.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub hub: Arc<LocalPush>,
    pub lifecycle: LifecycleHandler,
    pub dispatcher: BroadcastDispatcher,
}

impl AppState {
    /// Wire handlers over an opened store, using the configured push transport.
    pub fn new(config: Arc<Config>, store: Arc<dyn ConnectionStore>) -> RelayResult<Self> {
        let hub = Arc::new(LocalPush::new(config.outbound_buffer, config.push_timeout));
        let push = open_push(&config, hub.clone())?;
        Ok(Self {
            lifecycle: LifecycleHandler::new(store.clone()),
            dispatcher: BroadcastDispatcher::new(store, push),
            hub,
            config,
        })
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(routes::ws_handler))
        .route("/events/connect", post(routes::event_connect))
        .route("/events/disconnect", post(routes::event_disconnect))
        .route("/events/send", post(routes::event_send))
        .route("/admin/init", post(routes::admin_init))
        .layer(cors)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
