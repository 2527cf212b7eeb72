use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;

use super::protocol::{
    ENDPOINT_LIST, ENDPOINT_LOOKUP, ENDPOINT_REGISTER, ListResponse, LookupResponse,
    RegisterRequest,
};
use super::types::Endpoint;

/// Name registry used for discovery.
///
/// Any call may fail with a connectivity error. Discovery-side callers treat a
/// failed lookup exactly like a missing name.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Binds `name` to `endpoint`, overwriting any previous binding.
    async fn register(&self, name: &str, endpoint: &Endpoint) -> Result<()>;

    async fn lookup(&self, name: &str) -> Result<Option<Endpoint>>;

    async fn list(&self) -> Result<Vec<String>>;
}

/// `Directory` backed by the registry process over HTTP.
pub struct HttpDirectory {
    registry: Endpoint,
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpDirectory {
    pub fn new(registry: Endpoint, timeout: Duration) -> Self {
        Self {
            registry,
            http_client: crate::cluster_http_client(),
            timeout,
        }
    }

    async fn post_with_retry<T: serde::Serialize>(
        &self,
        url: String,
        payload: &T,
        attempts: usize,
    ) -> Result<reqwest::Response> {
        let mut delay_ms = 100u64;

        for attempt in 0..attempts {
            let response = self
                .http_client
                .post(url.clone())
                .json(payload)
                .timeout(self.timeout)
                .send()
                .await;

            match response {
                Ok(resp) => return Ok(resp),
                Err(e) => {
                    if attempt + 1 == attempts {
                        return Err(anyhow::anyhow!(e));
                    }
                    let jitter = rand::random::<u64>() % 50;
                    tokio::time::sleep(Duration::from_millis(delay_ms + jitter)).await;
                    delay_ms = (delay_ms * 2).min(800);
                }
            }
        }

        Err(anyhow::anyhow!("Retry attempts exhausted"))
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn register(&self, name: &str, endpoint: &Endpoint) -> Result<()> {
        let payload = RegisterRequest {
            name: name.to_string(),
            endpoint: endpoint.clone(),
        };
        let response = self
            .post_with_retry(self.registry.url(ENDPOINT_REGISTER), &payload, 3)
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Register failed: {}", response.status()));
        }

        tracing::debug!("Registered {} -> {}", name, endpoint);
        Ok(())
    }

    async fn lookup(&self, name: &str) -> Result<Option<Endpoint>> {
        let url = format!("{}/{}", self.registry.url(ENDPOINT_LOOKUP), name);
        let response = self
            .http_client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(anyhow::anyhow!("Lookup failed: {}", response.status()));
        }

        let lookup: LookupResponse = response.json().await?;
        Ok(lookup.endpoint)
    }

    async fn list(&self) -> Result<Vec<String>> {
        let response = self
            .http_client
            .get(self.registry.url(ENDPOINT_LIST))
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("List failed: {}", response.status()));
        }

        let list: ListResponse = response.json().await?;
        Ok(list.names)
    }
}
