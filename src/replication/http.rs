use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;

use super::channel::{DeliveryHandler, ReplicationChannel};
use super::protocol::{
    ENDPOINT_DELIVER, ENDPOINT_PUBLISH, ENDPOINT_SUBSCRIBE, ENDPOINT_UNSUBSCRIBE, PublishRequest,
    SubscribeRequest, UnsubscribeRequest,
};
use crate::directory::types::Endpoint;

/// Node-side channel to the registry's broker.
///
/// The broker pushes payloads to `<callback>/internal/deliver`; the node's HTTP
/// surface hands them to [`HttpChannel::deliver`].
pub struct HttpChannel {
    broker: Endpoint,
    callback: Endpoint,
    subscriber_id: String,
    handlers: DashMap<String, DeliveryHandler>,
    http_client: reqwest::Client,
    timeout: Duration,
}

impl HttpChannel {
    pub fn new(broker: Endpoint, callback: Endpoint, timeout: Duration) -> Self {
        Self {
            broker,
            callback,
            subscriber_id: uuid::Uuid::new_v4().to_string(),
            handlers: DashMap::new(),
            http_client: crate::cluster_http_client(),
            timeout,
        }
    }

    /// Runs the handler registered for `topic`. Returns `false` when there is none.
    pub async fn deliver(&self, topic: &str, payload: Vec<u8>) -> bool {
        let handler = self.handlers.get(topic).map(|entry| entry.value().clone());

        match handler {
            Some(handler) => {
                handler(payload).await;
                true
            }
            None => {
                tracing::debug!("Dropping delivery on {}: not subscribed", topic);
                false
            }
        }
    }

    async fn post<T: serde::Serialize>(&self, path: &str, payload: &T) -> Result<()> {
        let response = self
            .http_client
            .post(self.broker.url(path))
            .json(payload)
            .timeout(self.timeout)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!("{} failed: {}", path, response.status()));
        }
        Ok(())
    }
}

#[async_trait]
impl ReplicationChannel for HttpChannel {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let request = PublishRequest {
            topic: topic.to_string(),
            payload,
        };
        self.post(ENDPOINT_PUBLISH, &request).await
    }

    async fn subscribe(&self, topic: &str, handler: DeliveryHandler) -> Result<()> {
        self.handlers.insert(topic.to_string(), handler);

        let request = SubscribeRequest {
            topic: topic.to_string(),
            subscriber: self.subscriber_id.clone(),
            callback: self.callback.url(ENDPOINT_DELIVER),
        };

        if let Err(e) = self.post(ENDPOINT_SUBSCRIBE, &request).await {
            self.handlers.remove(topic);
            return Err(e);
        }

        tracing::info!("Subscribed to {} as {}", topic, self.subscriber_id);
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<()> {
        self.handlers.remove(topic);

        let request = UnsubscribeRequest {
            topic: topic.to_string(),
            subscriber: self.subscriber_id.clone(),
        };
        self.post(ENDPOINT_UNSUBSCRIBE, &request).await
    }
}
