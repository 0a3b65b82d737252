//! Route handlers.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{HeaderMap, StatusCode},
};
use futures_util::{SinkExt, StreamExt};
use uuid::Uuid;

use shared::{ws_types, CONNECTED_BODY, DISCONNECTED_BODY, INIT_BODY, MESSAGE_SENT_BODY};

use crate::api::AppState;
use crate::error::RelayError;
use crate::push::PushCapability;

/// Header carrying the gateway-assigned connection identifier on event routes.
pub const CONNECTION_ID_HEADER: &str = "x-connection-id";

// --- Gateway events ---

pub async fn event_connect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<&'static str, (StatusCode, String)> {
    let id = require_connection_id(&headers)?;
    state.lifecycle.connect(id).await?;
    Ok(CONNECTED_BODY)
}

pub async fn event_disconnect(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<&'static str, (StatusCode, String)> {
    let id = require_connection_id(&headers)?;
    state.lifecycle.disconnect(id).await?;
    Ok(DISCONNECTED_BODY)
}

/// Body: `{"message": ...}`; other fields ignored.
pub async fn event_send(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<&'static str, (StatusCode, String)> {
    state
        .dispatcher
        .send(connection_id(&headers), &body)
        .await?;
    Ok(MESSAGE_SENT_BODY)
}

pub async fn admin_init(
    State(state): State<AppState>,
) -> Result<&'static str, (StatusCode, String)> {
    state.lifecycle.init().await?;
    Ok(INIT_BODY)
}

fn connection_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(CONNECTION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn require_connection_id(headers: &HeaderMap) -> Result<&str, (StatusCode, String)> {
    connection_id(headers)
        .ok_or_else(|| RelayError::Validation("missing connection id".to_string()).into())
}

// --- WebSocket ---

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> axum::response::Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

fn envelope(kind: &str, payload: serde_json::Value) -> String {
    serde_json::json!({
        "version": 1,
        "type": kind,
        "payload": payload,
        "ts": chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string(),
    })
    .to_string()
}

/// Native socket: assign an identifier, register, then treat every text
/// frame as a send event until the peer goes away.
async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection_id = Uuid::new_v4().to_string();
    let (mut ws_tx, mut ws_rx) = socket.split();

    // Queue before registry, so a broadcast that lists this id finds a queue.
    let mut outbound = state.hub.register(&connection_id).await;
    if let Err(e) = state.lifecycle.connect(&connection_id).await {
        state.hub.unregister(&connection_id).await;
        let _ = ws_tx
            .send(Message::Text(
                envelope(ws_types::ERROR, serde_json::json!({"reason": e.to_string()})).into(),
            ))
            .await;
        let _ = ws_tx.send(Message::Close(None)).await;
        return;
    }

    let _ = ws_tx
        .send(Message::Text(
            envelope(
                ws_types::CONNECTED,
                serde_json::json!({"connection_id": connection_id}),
            )
            .into(),
        ))
        .await;

    let period = state.config.ping_interval;
    let mut ping_interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let writer = tokio::spawn(async move {
        loop {
            tokio::select! {
                frame = outbound.recv() => {
                    let Some(text) = frame else {
                        let _ = ws_tx.send(Message::Close(None)).await;
                        break;
                    };
                    if ws_tx.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                _ = ping_interval.tick() => {
                    if ws_tx.send(Message::Ping(axum::body::Bytes::new())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    while let Some(msg) = ws_rx.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Err(e) = state
                    .dispatcher
                    .send(Some(&connection_id), text.as_str())
                    .await
                {
                    tracing::warn!(connection_id = %connection_id, error = %e, "send rejected");
                    let reply =
                        envelope(ws_types::ERROR, serde_json::json!({"reason": e.to_string()}));
                    let _ = state.hub.push(&connection_id, &reply).await;
                }
            }
            Ok(Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    state.hub.unregister(&connection_id).await;
    writer.abort();
    // Best effort: a leftover id is evicted as Gone by the next broadcast.
    let _ = state.lifecycle.disconnect(&connection_id).await;
}
