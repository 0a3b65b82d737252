//! WebSocket client for the relay.

mod ws;

pub use ws::{message_body, parse_frame, run_chat, run_listen, run_send, Frame};
