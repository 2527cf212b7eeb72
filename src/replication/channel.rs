use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Topic every leader publishes accepted writes on.
pub const REPLICATION_TOPIC: &str = "replication/messages";

/// Type-erased asynchronous callback invoked once per delivered payload.
pub type DeliveryHandler =
    Arc<dyn Fn(Vec<u8>) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Wraps an async closure into a `DeliveryHandler`.
pub fn delivery_handler<F, Fut>(handler: F) -> DeliveryHandler
where
    F: Fn(Vec<u8>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(move |payload: Vec<u8>| {
        Box::pin(handler(payload)) as Pin<Box<dyn Future<Output = ()> + Send>>
    })
}

/// Publish/subscribe transport, as seen by one node.
#[async_trait]
pub trait ReplicationChannel: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<()>;

    /// Registers `handler` for `topic`, replacing any previous handler.
    ///
    /// Handlers run on a task owned by the transport, one payload at a time.
    async fn subscribe(&self, topic: &str, handler: DeliveryHandler) -> Result<()>;

    async fn unsubscribe(&self, topic: &str) -> Result<()>;
}
