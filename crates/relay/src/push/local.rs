//! Socket hub: outbound queues for WebSockets terminated by this process.
//!
//! Each socket registers a bounded queue under its connection identifier; a
//! writer task drains the queue onto the socket. Pushing to an identifier
//! with no queue, or whose writer has exited, reports `Gone`.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};

use super::{PushCapability, PushOutcome};

pub struct LocalPush {
    queues: RwLock<HashMap<String, mpsc::Sender<String>>>,
    buffer: usize,
    timeout: Duration,
}

impl LocalPush {
    pub fn new(buffer: usize, timeout: Duration) -> Self {
        Self {
            queues: RwLock::new(HashMap::new()),
            buffer: buffer.max(1),
            timeout,
        }
    }

    /// Register a queue for `connection_id` and hand back its receiving end.
    pub async fn register(&self, connection_id: &str) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(self.buffer);
        self.queues
            .write()
            .await
            .insert(connection_id.to_string(), tx);
        rx
    }

    pub async fn unregister(&self, connection_id: &str) {
        self.queues.write().await.remove(connection_id);
    }

    pub async fn is_registered(&self, connection_id: &str) -> bool {
        self.queues.read().await.contains_key(connection_id)
    }
}

#[async_trait]
impl PushCapability for LocalPush {
    async fn push(&self, connection_id: &str, payload: &str) -> PushOutcome {
        // Clone the sender so the map lock is not held while waiting on a slow socket.
        let tx = match self.queues.read().await.get(connection_id) {
            Some(tx) => tx.clone(),
            None => return PushOutcome::Gone,
        };
        match tx
            .send_timeout(payload.to_string(), self.timeout)
            .await
        {
            Ok(()) => PushOutcome::Delivered,
            Err(mpsc::error::SendTimeoutError::Closed(_)) => PushOutcome::Gone,
            Err(mpsc::error::SendTimeoutError::Timeout(_)) => PushOutcome::TransportFailure(
                format!("outbound queue full after {:?}", self.timeout),
            ),
        }
    }

    fn transport_name(&self) -> &'static str {
        "local"
    }
}
