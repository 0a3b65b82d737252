//! Gateway mode with native sockets alongside: ids whose socket lives in
//! this process go through the hub, everything else through the gateway.

use std::sync::Arc;

use async_trait::async_trait;

use super::{GatewayPush, LocalPush, PushCapability, PushOutcome};

pub struct RoutedPush {
    hub: Arc<LocalPush>,
    gateway: GatewayPush,
}

impl RoutedPush {
    pub fn new(hub: Arc<LocalPush>, gateway: GatewayPush) -> Self {
        Self { hub, gateway }
    }
}

#[async_trait]
impl PushCapability for RoutedPush {
    async fn push(&self, connection_id: &str, payload: &str) -> PushOutcome {
        // A socket closing between the check and the push reports Gone from the hub.
        if self.hub.is_registered(connection_id).await {
            self.hub.push(connection_id, payload).await
        } else {
            self.gateway.push(connection_id, payload).await
        }
    }

    fn transport_name(&self) -> &'static str {
        "gateway+local"
    }
}
