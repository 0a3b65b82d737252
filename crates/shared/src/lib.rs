//! Shared wire types for the push relay and its client.

mod models;

// Explicit re-exports (avoids rust-analyzer issues with `pub use models::*`)
pub use models::ws_types;
pub use models::{
    BroadcastReport, DeliveryFailure, SendRequest, WsConnectedPayload, WsEnvelope,
    WsErrorPayload, CONNECTED_BODY, DISCONNECTED_BODY, INIT_BODY, MESSAGE_SENT_BODY,
};
