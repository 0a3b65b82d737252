//! Broadcast fan-out.
//!
//! A send from one connection lists every other registered connection,
//! pushes to all of them concurrently and waits for every outcome. Gone
//! recipients are evicted from the registry; other failures are collected
//! into the report and never stop the remaining deliveries.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use shared::{BroadcastReport, DeliveryFailure, SendRequest};

use crate::error::{RelayError, RelayResult};
use crate::push::{PushCapability, PushOutcome};
use crate::store::ConnectionStore;

#[derive(Clone)]
pub struct BroadcastDispatcher {
    store: Arc<dyn ConnectionStore>,
    push: Arc<dyn PushCapability>,
}

impl BroadcastDispatcher {
    pub fn new(store: Arc<dyn ConnectionStore>, push: Arc<dyn PushCapability>) -> Self {
        Self { store, push }
    }

    /// Parse a raw send body. Runs before the store is touched.
    pub fn parse(sender_id: Option<&str>, body: &str) -> RelayResult<(String, SendRequest)> {
        let sender = sender_id
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| RelayError::Validation("missing connection id".to_string()))?;
        let request: SendRequest = serde_json::from_str(body)
            .map_err(|e| RelayError::Validation(format!("invalid send body: {}", e)))?;
        Ok((sender.to_string(), request))
    }

    /// Validate and broadcast a raw send body from `sender_id`.
    pub async fn send(&self, sender_id: Option<&str>, body: &str) -> RelayResult<BroadcastReport> {
        let (sender, request) = Self::parse(sender_id, body)?;
        self.broadcast(&sender, &request.payload_text()).await
    }

    /// Push `payload` to every registered connection except `sender`.
    ///
    /// Only a failure to list recipients is an error; per-recipient outcomes
    /// are reported in the returned [`BroadcastReport`].
    pub async fn broadcast(&self, sender: &str, payload: &str) -> RelayResult<BroadcastReport> {
        let recipients = self.store.list(Some(sender)).await?;

        let pushes = recipients.iter().map(|id| async move {
            let outcome = self.push.push(id, payload).await;
            (id, outcome)
        });
        let outcomes = join_all(pushes).await;

        let mut report = BroadcastReport {
            attempted: outcomes.len(),
            ..BroadcastReport::default()
        };
        for (id, outcome) in outcomes {
            match outcome {
                PushOutcome::Delivered => report.delivered += 1,
                PushOutcome::Gone => {
                    info!(connection_id = %id, "found stale connection, evicting");
                    if let Err(e) = self.store.remove(id).await {
                        warn!(connection_id = %id, error = %e, "stale connection eviction failed");
                    }
                    report.evicted.push(id.clone());
                }
                PushOutcome::TransportFailure(reason) => {
                    warn!(connection_id = %id, reason = %reason, "push failed");
                    report.failures.push(DeliveryFailure {
                        connection_id: id.clone(),
                        reason,
                    });
                }
            }
        }

        info!(
            sender = %sender,
            attempted = report.attempted,
            delivered = report.delivered,
            evicted = report.evicted.len(),
            failed = report.failures.len(),
            transport = self.push.transport_name(),
            "broadcast complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::Barrier;

    /// Push double: outcome per id (default Delivered), records every attempt.
    #[derive(Default)]
    struct ScriptedPush {
        outcomes: HashMap<String, PushOutcome>,
        attempts: Mutex<Vec<(String, String)>>,
        /// When set, every push parks here until all parties are in flight.
        in_flight: Option<Arc<Barrier>>,
    }

    impl ScriptedPush {
        fn with(outcomes: &[(&str, PushOutcome)]) -> Self {
            Self {
                outcomes: outcomes
                    .iter()
                    .map(|(id, o)| (id.to_string(), o.clone()))
                    .collect(),
                attempts: Mutex::new(Vec::new()),
                in_flight: None,
            }
        }

        fn gated(parties: usize) -> Self {
            Self {
                in_flight: Some(Arc::new(Barrier::new(parties))),
                ..Self::default()
            }
        }

        fn attempted_ids(&self) -> Vec<String> {
            let mut ids: Vec<String> = self
                .attempts
                .lock()
                .unwrap()
                .iter()
                .map(|(id, _)| id.clone())
                .collect();
            ids.sort();
            ids
        }
    }

    #[async_trait]
    impl PushCapability for ScriptedPush {
        async fn push(&self, connection_id: &str, payload: &str) -> PushOutcome {
            self.attempts
                .lock()
                .unwrap()
                .push((connection_id.to_string(), payload.to_string()));
            if let Some(barrier) = &self.in_flight {
                barrier.wait().await;
            }
            self.outcomes
                .get(connection_id)
                .cloned()
                .unwrap_or(PushOutcome::Delivered)
        }

        fn transport_name(&self) -> &'static str {
            "scripted"
        }
    }

    /// Registry whose removals always fail.
    struct StuckStore(MemoryStore);

    #[async_trait]
    impl ConnectionStore for StuckStore {
        async fn init(&self) -> RelayResult<()> {
            Ok(())
        }

        async fn add(&self, id: &str) -> RelayResult<()> {
            self.0.add(id).await
        }

        async fn remove(&self, _id: &str) -> RelayResult<()> {
            Err(RelayError::Persistence("store unreachable".to_string()))
        }

        async fn list(&self, excluding: Option<&str>) -> RelayResult<Vec<String>> {
            self.0.list(excluding).await
        }

        fn backend_name(&self) -> &'static str {
            "stuck"
        }
    }

    async fn registry(ids: &[&str]) -> Arc<dyn ConnectionStore> {
        let store = MemoryStore::new();
        for id in ids {
            store.add(id).await.unwrap();
        }
        Arc::new(store)
    }

    async fn sorted(store: &Arc<dyn ConnectionStore>) -> Vec<String> {
        let mut ids = store.list(None).await.unwrap();
        ids.sort();
        ids
    }

    #[tokio::test]
    async fn attempts_every_other_connection() {
        let store = registry(&["a", "b", "c", "d"]).await;
        let push = Arc::new(ScriptedPush::default());
        let dispatcher = BroadcastDispatcher::new(store, push.clone());

        let report = dispatcher
            .send(Some("b"), r#"{"message":"hello"}"#)
            .await
            .unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 3);
        assert_eq!(push.attempted_ids(), vec!["a", "c", "d"]);
        assert!(push
            .attempts
            .lock()
            .unwrap()
            .iter()
            .all(|(_, payload)| payload == "hello"));
    }

    #[tokio::test]
    async fn gone_recipient_is_evicted_and_send_succeeds() {
        let store = registry(&["A", "B", "C"]).await;
        let push = Arc::new(ScriptedPush::with(&[("B", PushOutcome::Gone)]));
        let dispatcher = BroadcastDispatcher::new(store.clone(), push.clone());

        let report = dispatcher.send(Some("A"), r#"{"message":"hi"}"#).await.unwrap();
        assert_eq!(report.attempted, 2);
        assert_eq!(report.evicted, vec!["B".to_string()]);
        assert!(report.failures.is_empty());
        assert_eq!(sorted(&store).await, vec!["A", "C"]);

        let push_after = Arc::new(ScriptedPush::default());
        let dispatcher = BroadcastDispatcher::new(store.clone(), push_after.clone());
        let report = dispatcher.send(Some("C"), r#"{"message":"yo"}"#).await.unwrap();
        assert_eq!(report.attempted, 1);
        assert_eq!(push_after.attempted_ids(), vec!["A"]);
    }

    #[tokio::test]
    async fn transport_failure_is_reported_and_others_still_delivered() {
        let store = registry(&["s", "x", "y", "z"]).await;
        let push = Arc::new(ScriptedPush::with(&[(
            "x",
            PushOutcome::TransportFailure("throttled".to_string()),
        )]));
        let dispatcher = BroadcastDispatcher::new(store.clone(), push.clone());

        let report = dispatcher.send(Some("s"), r#"{"message":"m"}"#).await.unwrap();
        assert_eq!(report.attempted, 3);
        assert_eq!(report.delivered, 2);
        assert_eq!(
            report.failures,
            vec![DeliveryFailure {
                connection_id: "x".to_string(),
                reason: "throttled".to_string(),
            }]
        );
        assert_eq!(push.attempted_ids(), vec!["x", "y", "z"]);
        assert!(sorted(&store).await.contains(&"x".to_string()));
    }

    #[tokio::test]
    async fn malformed_body_is_rejected_before_listing() {
        let store = registry(&["a", "b"]).await;
        let push = Arc::new(ScriptedPush::default());
        let dispatcher = BroadcastDispatcher::new(store, push.clone());

        let err = dispatcher.send(Some("a"), "not json").await.unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        let err = dispatcher
            .send(Some("a"), r#"{"msg":"wrong field"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        let err = dispatcher
            .send(None, r#"{"message":"hi"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::Validation(_)));
        assert!(push.attempted_ids().is_empty());
    }

    #[tokio::test]
    async fn lone_sender_reaches_nobody() {
        let store = registry(&["only"]).await;
        let push = Arc::new(ScriptedPush::default());
        let dispatcher = BroadcastDispatcher::new(store, push.clone());
        let report = dispatcher
            .send(Some("only"), r#"{"message":"echo?"}"#)
            .await
            .unwrap();
        assert_eq!(report, BroadcastReport::default());
    }

    #[tokio::test]
    async fn pushes_are_in_flight_together() {
        // Each push waits until all three are in flight; a sequential loop never gets there.
        let store = registry(&["s", "a", "b", "c"]).await;
        let push = Arc::new(ScriptedPush::gated(3));
        let dispatcher = BroadcastDispatcher::new(store, push.clone());

        let report = tokio::time::timeout(
            Duration::from_secs(2),
            dispatcher.send(Some("s"), r#"{"message":"m"}"#),
        )
        .await
        .expect("pushes were not concurrent")
        .unwrap();
        assert_eq!(report.delivered, 3);
    }

    #[tokio::test]
    async fn failed_eviction_still_completes_send() {
        let inner = MemoryStore::new();
        for id in ["a", "b", "c"] {
            inner.add(id).await.unwrap();
        }
        let store: Arc<dyn ConnectionStore> = Arc::new(StuckStore(inner));
        let push = Arc::new(ScriptedPush::with(&[("b", PushOutcome::Gone)]));
        let dispatcher = BroadcastDispatcher::new(store.clone(), push.clone());

        let report = dispatcher.send(Some("a"), r#"{"message":"hi"}"#).await.unwrap();
        assert_eq!(report.attempted, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(report.evicted, vec!["b".to_string()]);
        assert!(report.failures.is_empty());
        // Still listed; the next broadcast retries the eviction.
        assert!(sorted(&store).await.contains(&"b".to_string()));
    }
}
