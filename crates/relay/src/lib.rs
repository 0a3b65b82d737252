//! Push relay: connection registry and broadcast fan-out.

pub mod api;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod lifecycle;
pub mod push;
pub mod store;
