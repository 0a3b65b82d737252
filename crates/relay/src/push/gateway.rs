//! Gateway transport: push through an external connection-management API.
//!
//! Used when an upstream gateway terminates the sockets and forwards
//! connect/disconnect/send events to this relay over HTTP. Each push is a
//! `POST {endpoint}/@connections/{id}` with the payload as the body; the id
//! is a single percent-encoded path segment.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::warn;

use super::{PushCapability, PushOutcome};
use crate::error::{RelayError, RelayResult};

#[derive(Debug)]
pub struct GatewayPush {
    endpoint: Url,
    client: reqwest::Client,
}

impl GatewayPush {
    pub fn new(endpoint: &str, timeout: Duration) -> RelayResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| RelayError::Validation(format!("gateway endpoint {}: {}", endpoint, e)))?;
        if endpoint.cannot_be_a_base() {
            return Err(RelayError::Validation(format!(
                "gateway endpoint {} cannot carry a path",
                endpoint
            )));
        }
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::Validation(format!("gateway client: {}", e)))?;
        Ok(Self { endpoint, client })
    }

    fn connection_url(&self, connection_id: &str) -> Url {
        let mut url = self.endpoint.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("@connections").push(connection_id);
        }
        url
    }
}

#[async_trait]
impl PushCapability for GatewayPush {
    async fn push(&self, connection_id: &str, payload: &str) -> PushOutcome {
        let url = self.connection_url(connection_id);
        let result = self
            .client
            .post(url.clone())
            .body(payload.to_string())
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => PushOutcome::Delivered,
            Ok(response) if response.status() == StatusCode::GONE => PushOutcome::Gone,
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.text().await.unwrap_or_default();
                warn!(status, body = %body, connection_id = %connection_id, "gateway push rejected");
                PushOutcome::TransportFailure(format!("gateway status {}: {}", status, body))
            }
            Err(e) => {
                warn!(error = %e, url = %url, "gateway push request failed");
                PushOutcome::TransportFailure(e.to_string())
            }
        }
    }

    fn transport_name(&self) -> &'static str {
        "gateway"
    }
}

/// Fake management API for tests: "gone-*" ids answer 410, "boom-*" answer
/// 500, anything else 200. Every decoded id it sees is recorded.
#[cfg(test)]
pub(crate) mod fake {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
        routing::post,
        Router,
    };

    pub type Seen = Arc<Mutex<Vec<String>>>;

    async fn post_to_connection(
        State(seen): State<Seen>,
        Path(id): Path<String>,
        _body: String,
    ) -> StatusCode {
        let status = if id.starts_with("gone-") {
            StatusCode::GONE
        } else if id.starts_with("boom-") {
            StatusCode::INTERNAL_SERVER_ERROR
        } else {
            StatusCode::OK
        };
        seen.lock().unwrap().push(id);
        status
    }

    /// Returns the endpoint (`http://addr/dev`) and the ids it received.
    pub async fn spawn() -> (String, Seen) {
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/dev/@connections/{id}", post(post_to_connection))
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/dev", addr), seen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn status_codes_map_to_outcomes() {
        let (endpoint, _) = fake::spawn().await;
        let gateway = GatewayPush::new(&endpoint, Duration::from_secs(2)).unwrap();

        assert_eq!(gateway.push("ok-1", "hi").await, PushOutcome::Delivered);
        assert_eq!(gateway.push("gone-1", "hi").await, PushOutcome::Gone);
        assert!(matches!(
            gateway.push("boom-1", "hi").await,
            PushOutcome::TransportFailure(_)
        ));
    }

    #[tokio::test]
    async fn reserved_characters_stay_in_one_segment() {
        let (endpoint, seen) = fake::spawn().await;
        let gateway = GatewayPush::new(&format!("{}/", endpoint), Duration::from_secs(2)).unwrap();

        for id in ["gone-a/b=", "gone-a?b", "gone-x#y", "gone-100%"] {
            assert_eq!(gateway.push(id, "hi").await, PushOutcome::Gone, "{}", id);
        }
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["gone-a/b=", "gone-a?b", "gone-x#y", "gone-100%"]
        );
    }

    #[test]
    fn endpoint_must_be_a_url() {
        assert!(matches!(
            GatewayPush::new("not a url", Duration::from_secs(1)),
            Err(RelayError::Validation(_))
        ));
        assert!(matches!(
            GatewayPush::new("mailto:ops@example.com", Duration::from_secs(1)),
            Err(RelayError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_gateway_is_transport_failure() {
        let gateway = GatewayPush::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
        assert!(matches!(
            gateway.push("any", "hi").await,
            PushOutcome::TransportFailure(_)
        ));
    }
}
