use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::protocol::DeliverRequest;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(2);

/// Consecutive failed deliveries after which a subscriber is considered gone.
pub const MAX_DELIVERY_FAILURES: u32 = 3;

type Topics = Arc<DashMap<String, DashMap<String, Subscriber>>>;

/// Registry-side fan-out.
///
/// Every subscriber owns a FIFO queue drained by a single forwarding task, so
/// payloads reach a subscriber in publish order. A failed delivery is logged and
/// dropped; after `MAX_DELIVERY_FAILURES` in a row the subscriber is removed.
pub struct Broker {
    topics: Topics,
    http_client: reqwest::Client,
}

struct Subscriber {
    /// Distinguishes a re-subscription under the same id.
    generation: uuid::Uuid,
    callback: String,
    queue: mpsc::UnboundedSender<Vec<u8>>,
    forwarder: JoinHandle<()>,
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.forwarder.abort();
    }
}

impl Broker {
    pub fn new() -> Self {
        Self {
            topics: Arc::new(DashMap::new()),
            http_client: crate::cluster_http_client(),
        }
    }

    pub fn subscribe(&self, topic: &str, subscriber_id: &str, callback: String) {
        let (tx, rx) = mpsc::unbounded_channel();
        let generation = uuid::Uuid::new_v4();
        let forwarder = tokio::spawn(forward_loop(
            ForwardTarget {
                topics: self.topics.clone(),
                topic: topic.to_string(),
                subscriber_id: subscriber_id.to_string(),
                generation,
                callback: callback.clone(),
            },
            self.http_client.clone(),
            rx,
        ));

        let subscriber = Subscriber {
            generation,
            callback,
            queue: tx,
            forwarder,
        };

        tracing::info!(
            "Subscriber {} on {} -> {}",
            subscriber_id,
            topic,
            subscriber.callback
        );

        self.topics
            .entry(topic.to_string())
            .or_default()
            .insert(subscriber_id.to_string(), subscriber);
    }

    pub fn unsubscribe(&self, topic: &str, subscriber_id: &str) -> bool {
        let removed = self
            .topics
            .get(topic)
            .and_then(|subscribers| subscribers.remove(subscriber_id))
            .is_some();

        if removed {
            tracing::info!("Subscriber {} left {}", subscriber_id, topic);
        }
        removed
    }

    /// Queues `payload` for every current subscriber of `topic`.
    pub fn publish(&self, topic: &str, payload: Vec<u8>) -> usize {
        let Some(subscribers) = self.topics.get(topic) else {
            return 0;
        };

        let mut queued = 0;
        for entry in subscribers.iter() {
            if entry.value().queue.send(payload.clone()).is_ok() {
                queued += 1;
            }
        }

        tracing::debug!("Queued payload on {} for {} subscriber(s)", topic, queued);
        queued
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a forwarding task delivers, and how it finds its own entry again.
struct ForwardTarget {
    topics: Topics,
    topic: String,
    subscriber_id: String,
    generation: uuid::Uuid,
    callback: String,
}

impl ForwardTarget {
    /// Removes this subscription unless it was already replaced.
    fn evict(&self) -> Option<Subscriber> {
        let subscribers = self.topics.get(&self.topic)?;
        subscribers
            .remove_if(&self.subscriber_id, |_, current| {
                current.generation == self.generation
            })
            .map(|(_, subscriber)| subscriber)
    }
}

async fn forward_loop(
    target: ForwardTarget,
    http_client: reqwest::Client,
    mut rx: mpsc::UnboundedReceiver<Vec<u8>>,
) {
    let mut failures = 0u32;

    while let Some(payload) = rx.recv().await {
        let request = DeliverRequest {
            topic: target.topic.clone(),
            payload,
        };

        let response = http_client
            .post(target.callback.clone())
            .json(&request)
            .timeout(DELIVERY_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                failures = 0;
                tracing::debug!("Delivered payload on {} to {}", target.topic, target.callback);
                continue;
            }
            Ok(resp) => {
                tracing::warn!("Delivery to {} rejected: {}", target.callback, resp.status());
            }
            Err(e) => {
                tracing::warn!("Delivery to {} failed: {}", target.callback, e);
            }
        }

        failures += 1;
        if failures >= MAX_DELIVERY_FAILURES {
            tracing::info!(
                "Dropping subscriber {} on {} after {} failed deliveries",
                target.subscriber_id,
                target.topic,
                failures
            );
            // Dropping the entry aborts this task; nothing may await after it.
            let evicted = target.evict();
            drop(evicted);
            return;
        }
    }
}
