use async_trait::async_trait;
use std::time::Duration;

use super::protocol::{
    ENDPOINT_ECHO, ENDPOINT_HISTORY, ENDPOINT_PROBE, EchoRequest, EchoResponse, HistoryResponse,
    ProbeResponse,
};
use super::types::NodeError;
use crate::directory::types::Endpoint;

/// Remote view of another node's public operations.
#[async_trait]
pub trait PeerClient: Send + Sync {
    async fn probe(&self, endpoint: &Endpoint) -> Result<bool, NodeError>;

    async fn history(&self, endpoint: &Endpoint) -> Result<Vec<String>, NodeError>;

    async fn write(&self, endpoint: &Endpoint, content: &str) -> Result<String, NodeError>;
}

/// `PeerClient` over the node HTTP surface.
pub struct HttpPeerClient {
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpPeerClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http_client: crate::cluster_http_client(),
            timeout,
        }
    }

    async fn decode_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, NodeError> {
        let status = response.status();

        if status.is_success() {
            return response.json::<T>().await.map_err(NodeError::unreachable);
        }

        if status == reqwest::StatusCode::SERVICE_UNAVAILABLE
            && let Ok(error) = response.json::<NodeError>().await
        {
            return Err(error);
        }

        Err(NodeError::Unreachable(format!("unexpected status {}", status)))
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn probe(&self, endpoint: &Endpoint) -> Result<bool, NodeError> {
        let response = self
            .http_client
            .get(endpoint.url(ENDPOINT_PROBE))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(NodeError::unreachable)?;

        let probe: ProbeResponse = Self::decode_response(response).await?;
        Ok(probe.alive)
    }

    async fn history(&self, endpoint: &Endpoint) -> Result<Vec<String>, NodeError> {
        let response = self
            .http_client
            .get(endpoint.url(ENDPOINT_HISTORY))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(NodeError::unreachable)?;

        let history: HistoryResponse = Self::decode_response(response).await?;
        Ok(history.messages)
    }

    async fn write(&self, endpoint: &Endpoint, content: &str) -> Result<String, NodeError> {
        let request = EchoRequest {
            content: content.to_string(),
        };
        let response = self
            .http_client
            .post(endpoint.url(ENDPOINT_ECHO))
            .json(&request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(NodeError::unreachable)?;

        let echo: EchoResponse = Self::decode_response(response).await?;
        Ok(echo.reply)
    }
}
