//! Connection lifecycle: open and close events mutate the registry.

use std::sync::Arc;

use tracing::{error, info};

use crate::error::RelayResult;
use crate::store::ConnectionStore;

#[derive(Clone)]
pub struct LifecycleHandler {
    store: Arc<dyn ConnectionStore>,
}

impl LifecycleHandler {
    pub fn new(store: Arc<dyn ConnectionStore>) -> Self {
        Self { store }
    }

    /// Register a newly opened connection.
    pub async fn connect(&self, connection_id: &str) -> RelayResult<()> {
        match self.store.add(connection_id).await {
            Ok(()) => {
                info!(connection_id = %connection_id, "client connected");
                Ok(())
            }
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "connect failed");
                Err(e)
            }
        }
    }

    /// Deregister a closed connection. Unknown identifiers are not an error.
    pub async fn disconnect(&self, connection_id: &str) -> RelayResult<()> {
        match self.store.remove(connection_id).await {
            Ok(()) => {
                info!(connection_id = %connection_id, "client disconnected");
                Ok(())
            }
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "disconnect failed");
                Err(e)
            }
        }
    }

    /// Provision the backing structure; a no-op for the key-value backing.
    pub async fn init(&self) -> RelayResult<()> {
        self.store.init().await?;
        info!(backend = self.store.backend_name(), "connection store ready");
        Ok(())
    }
}
