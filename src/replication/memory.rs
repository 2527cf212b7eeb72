use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::channel::{DeliveryHandler, ReplicationChannel};

const DEFAULT_CAPACITY: usize = 1024;

/// In-process broker: one broadcast channel per topic.
///
/// If a subscriber falls more than `capacity` payloads behind, the oldest ones are
/// lost for that subscriber only.
pub struct InMemoryBroker {
    topics: DashMap<String, broadcast::Sender<Vec<u8>>>,
    capacity: usize,
    offline: AtomicBool,
}

impl InMemoryBroker {
    pub fn new() -> Arc<Self> {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            topics: DashMap::new(),
            capacity,
            offline: AtomicBool::new(false),
        })
    }

    fn sender(&self, topic: &str) -> broadcast::Sender<Vec<u8>> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }

    /// Returns the number of subscribers the payload reached.
    pub fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<usize> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Broker unreachable"));
        }
        // `send` only fails when nobody is subscribed.
        Ok(self.sender(topic).send(payload).unwrap_or(0))
    }

    pub fn receiver(&self, topic: &str) -> broadcast::Receiver<Vec<u8>> {
        self.sender(topic).subscribe()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }
}

/// A node's connection to an `InMemoryBroker`.
pub struct LocalChannel {
    broker: Arc<InMemoryBroker>,
    subscriptions: DashMap<String, JoinHandle<()>>,
}

impl LocalChannel {
    pub fn new(broker: Arc<InMemoryBroker>) -> Self {
        Self {
            broker,
            subscriptions: DashMap::new(),
        }
    }

    pub fn is_subscribed(&self, topic: &str) -> bool {
        self.subscriptions.contains_key(topic)
    }
}

#[async_trait]
impl ReplicationChannel for LocalChannel {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()> {
        let reached = self.broker.publish(topic, payload)?;
        tracing::debug!("Published on {} to {} subscriber(s)", topic, reached);
        Ok(())
    }

    async fn subscribe(&self, topic: &str, handler: DeliveryHandler) -> Result<()> {
        let mut rx = self.broker.receiver(topic);
        let topic_name = topic.to_string();

        let delivery = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(payload) => handler(payload).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Subscriber on {} lagged, {} payload(s) lost", topic_name, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        if let Some(previous) = self.subscriptions.insert(topic.to_string(), delivery) {
            previous.abort();
        }
        Ok(())
    }

    async fn unsubscribe(&self, topic: &str) -> Result<()> {
        if let Some((_, delivery)) = self.subscriptions.remove(topic) {
            delivery.abort();
        }
        Ok(())
    }
}

impl Drop for LocalChannel {
    fn drop(&mut self) {
        for entry in self.subscriptions.iter() {
            entry.value().abort();
        }
    }
}
