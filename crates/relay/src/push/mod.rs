//! Push capability: deliver one payload to one connection.

pub(crate) mod gateway;
mod local;
mod routed;

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Config, PushBackend};
use crate::error::RelayResult;

pub use gateway::GatewayPush;
pub use local::LocalPush;
pub use routed::RoutedPush;

/// Typed delivery status reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    Delivered,
    /// The identifier no longer corresponds to an open connection.
    Gone,
    TransportFailure(String),
}

#[async_trait]
pub trait PushCapability: Send + Sync {
    /// Attempt delivery. Implementations bound each attempt by their own timeout.
    async fn push(&self, connection_id: &str, payload: &str) -> PushOutcome;

    fn transport_name(&self) -> &'static str;
}

/// Build the configured transport. Native sockets always register with the
/// hub, so gateway mode still routes their ids through it.
pub fn open_push(
    config: &Config,
    hub: Arc<LocalPush>,
) -> RelayResult<Arc<dyn PushCapability>> {
    match &config.push_backend {
        PushBackend::Local => Ok(hub),
        PushBackend::Gateway { endpoint } => {
            let gateway = GatewayPush::new(endpoint, config.push_timeout)?;
            Ok(Arc::new(RoutedPush::new(hub, gateway)))
        }
    }
}
