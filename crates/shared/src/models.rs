//! Shared request/response and wire models.

use serde::{Deserialize, Serialize};

/// Response body for a successful connect event.
pub const CONNECTED_BODY: &str = "Connected.";
/// Response body for a successful disconnect event.
pub const DISCONNECTED_BODY: &str = "Disconnected.";
/// Response body for a completed broadcast.
pub const MESSAGE_SENT_BODY: &str = "Message sent.";
/// Response body for schema provisioning.
pub const INIT_BODY: &str = "OK";

/// Send event body. Only `message` is read; other fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendRequest {
    pub message: serde_json::Value,
}

impl SendRequest {
    /// Text pushed to recipients: strings verbatim, anything else as compact JSON.
    pub fn payload_text(&self) -> String {
        match &self.message {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// A recipient whose push failed for a reason other than being gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryFailure {
    pub connection_id: String,
    pub reason: String,
}

/// Aggregate outcome of one broadcast.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastReport {
    /// Number of recipients a push was attempted for.
    pub attempted: usize,
    pub delivered: usize,
    /// Recipients removed from the registry because the transport reported them gone.
    pub evicted: Vec<String>,
    pub failures: Vec<DeliveryFailure>,
}

// --- WebSocket envelope ---

/// WebSocket control envelope (version 1). Broadcast payloads are sent raw, not enveloped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsEnvelope {
    #[serde(default)]
    pub version: u8,
    pub r#type: String,
    pub payload: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
}

/// WebSocket envelope types.
pub mod ws_types {
    pub const CONNECTED: &str = "connected";
    pub const ERROR: &str = "error";
}

/// connected payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsConnectedPayload {
    pub connection_id: String,
}

/// error payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WsErrorPayload {
    pub reason: String,
}
