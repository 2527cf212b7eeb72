//! Replication Module Tests
//!
//! ## Test Scopes
//! - **Events**: Payload encoding of a replication event.
//! - **In-memory channel**: Ordered delivery, unsubscribe, broker outage.
//! - **HTTP broker**: Subscription bookkeeping and a full publish -> deliver trip
//!   through a locally bound server.

#[cfg(test)]
mod tests {
    use crate::directory::types::Endpoint;
    use crate::node::types::NodeId;
    use crate::replication::broker::{Broker, MAX_DELIVERY_FAILURES};
    use crate::replication::channel::{REPLICATION_TOPIC, ReplicationChannel, delivery_handler};
    use crate::replication::event::ReplicationEvent;
    use crate::replication::handlers::{handle_publish, handle_subscribe, handle_unsubscribe};
    use crate::replication::http::HttpChannel;
    use crate::replication::memory::{InMemoryBroker, LocalChannel};
    use crate::testing::{WAIT, eventually};
    use crate::replication::protocol::{
        DeliverRequest, ENDPOINT_DELIVER, ENDPOINT_PUBLISH, ENDPOINT_SUBSCRIBE,
        ENDPOINT_UNSUBSCRIBE,
    };
    use axum::extract::Extension;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::mpsc;

    fn collecting_handler() -> (
        crate::replication::channel::DeliveryHandler,
        mpsc::UnboundedReceiver<Vec<u8>>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handler = delivery_handler(move |payload| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(payload);
            }
        });
        (handler, rx)
    }

    async fn recv_within(rx: &mut mpsc::UnboundedReceiver<Vec<u8>>) -> Option<Vec<u8>> {
        tokio::time::timeout(Duration::from_secs(2), rx.recv())
            .await
            .ok()
            .flatten()
    }

    // ============================================================
    // EVENTS
    // ============================================================

    #[test]
    fn test_event_payload_decodes_to_same_event() {
        let event = ReplicationEvent::new(NodeId::new(), "hello".to_string());

        let payload = event.encode().expect("encode failed");
        let decoded = ReplicationEvent::decode(&payload).expect("decode failed");

        assert_eq!(decoded, event);
    }

    #[test]
    fn test_garbage_payload_fails_to_decode() {
        assert!(ReplicationEvent::decode(&[0xff]).is_err());
    }

    // ============================================================
    // IN-MEMORY CHANNEL
    // ============================================================

    #[tokio::test]
    async fn test_local_channel_delivers_in_publish_order() {
        let broker = InMemoryBroker::new();
        let publisher = LocalChannel::new(broker.clone());
        let subscriber = LocalChannel::new(broker.clone());

        let (handler, mut rx) = collecting_handler();
        subscriber.subscribe(REPLICATION_TOPIC, handler).await.unwrap();
        assert!(subscriber.is_subscribed(REPLICATION_TOPIC));

        for i in 0..10u8 {
            publisher.publish(REPLICATION_TOPIC, vec![i]).await.unwrap();
        }

        for i in 0..10u8 {
            assert_eq!(recv_within(&mut rx).await, Some(vec![i]));
        }
    }

    #[tokio::test]
    async fn test_every_subscriber_receives_each_payload() {
        let broker = InMemoryBroker::new();
        let publisher = LocalChannel::new(broker.clone());
        let first = LocalChannel::new(broker.clone());
        let second = LocalChannel::new(broker.clone());

        let (handler_a, mut rx_a) = collecting_handler();
        let (handler_b, mut rx_b) = collecting_handler();
        first.subscribe(REPLICATION_TOPIC, handler_a).await.unwrap();
        second.subscribe(REPLICATION_TOPIC, handler_b).await.unwrap();
        assert_eq!(broker.subscriber_count(REPLICATION_TOPIC), 2);

        publisher.publish(REPLICATION_TOPIC, b"x".to_vec()).await.unwrap();

        assert_eq!(recv_within(&mut rx_a).await, Some(b"x".to_vec()));
        assert_eq!(recv_within(&mut rx_b).await, Some(b"x".to_vec()));
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_delivery() {
        let broker = InMemoryBroker::new();
        let channel = LocalChannel::new(broker.clone());

        let (handler, mut rx) = collecting_handler();
        channel.subscribe(REPLICATION_TOPIC, handler).await.unwrap();
        channel.unsubscribe(REPLICATION_TOPIC).await.unwrap();
        assert!(!channel.is_subscribed(REPLICATION_TOPIC));

        broker.publish(REPLICATION_TOPIC, b"late".to_vec()).unwrap();

        let received = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
        assert!(!matches!(received, Ok(Some(_))));
    }

    #[tokio::test]
    async fn test_publish_without_subscribers_is_not_an_error() {
        let broker = InMemoryBroker::new();

        assert_eq!(broker.publish(REPLICATION_TOPIC, vec![1]).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_offline_broker_fails_publish() {
        let broker = InMemoryBroker::new();
        let channel = LocalChannel::new(broker.clone());
        broker.set_offline(true);

        assert!(channel.publish(REPLICATION_TOPIC, vec![1]).await.is_err());
    }

    // ============================================================
    // HTTP BROKER
    // ============================================================

    #[tokio::test]
    async fn test_broker_subscription_bookkeeping() {
        let broker = Broker::new();

        broker.subscribe(REPLICATION_TOPIC, "a", "http://127.0.0.1:1/deliver".to_string());
        broker.subscribe(REPLICATION_TOPIC, "b", "http://127.0.0.1:1/deliver".to_string());
        // Same id replaces the previous subscription
        broker.subscribe(REPLICATION_TOPIC, "a", "http://127.0.0.1:2/deliver".to_string());
        assert_eq!(broker.subscriber_count(REPLICATION_TOPIC), 2);

        assert!(broker.unsubscribe(REPLICATION_TOPIC, "a"));
        assert!(!broker.unsubscribe(REPLICATION_TOPIC, "a"));
        assert_eq!(broker.subscriber_count(REPLICATION_TOPIC), 1);

        assert_eq!(broker.publish("other/topic", vec![1]), 0);
    }

    #[tokio::test]
    async fn test_unreachable_subscriber_is_dropped() {
        let broker = Broker::new();
        broker.subscribe(
            REPLICATION_TOPIC,
            "gone",
            "http://127.0.0.1:1/internal/deliver".to_string(),
        );

        for n in 0..MAX_DELIVERY_FAILURES + 2 {
            broker.publish(REPLICATION_TOPIC, vec![n as u8]);
        }

        let broker = &broker;
        assert!(
            eventually(WAIT, || async move {
                broker.subscriber_count(REPLICATION_TOPIC) == 0
            })
            .await
        );
        assert_eq!(broker.publish(REPLICATION_TOPIC, vec![9]), 0);
    }

    #[tokio::test]
    async fn test_resubscribed_id_survives_eviction_of_old_entry() {
        let broker = Broker::new();
        broker.subscribe(REPLICATION_TOPIC, "node", "http://127.0.0.1:1/a".to_string());
        for n in 0..MAX_DELIVERY_FAILURES {
            broker.publish(REPLICATION_TOPIC, vec![n as u8]);
        }
        // Replacing aborts the old forwarder; the new entry stays until it fails itself
        broker.subscribe(REPLICATION_TOPIC, "node", "http://127.0.0.1:1/b".to_string());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(broker.subscriber_count(REPLICATION_TOPIC), 1);
    }

    async fn handle_test_deliver(
        Extension(channel): Extension<Arc<HttpChannel>>,
        Json(req): Json<DeliverRequest>,
    ) -> StatusCode {
        if channel.deliver(&req.topic, req.payload).await {
            StatusCode::OK
        } else {
            StatusCode::NOT_FOUND
        }
    }

    #[tokio::test]
    async fn test_http_channel_publish_reaches_subscriber() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = Endpoint::new(format!("http://{}", listener.local_addr().unwrap()));

        let broker = Arc::new(Broker::new());
        let channel = Arc::new(HttpChannel::new(
            endpoint.clone(),
            endpoint.clone(),
            Duration::from_secs(2),
        ));

        let app = Router::new()
            .route(ENDPOINT_PUBLISH, post(handle_publish))
            .route(ENDPOINT_SUBSCRIBE, post(handle_subscribe))
            .route(ENDPOINT_UNSUBSCRIBE, post(handle_unsubscribe))
            .route(ENDPOINT_DELIVER, post(handle_test_deliver))
            .layer(Extension(broker.clone()))
            .layer(Extension(channel.clone()));

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        let (handler, mut rx) = collecting_handler();
        channel.subscribe(REPLICATION_TOPIC, handler).await.unwrap();
        assert_eq!(broker.subscriber_count(REPLICATION_TOPIC), 1);

        channel.publish(REPLICATION_TOPIC, b"one".to_vec()).await.unwrap();
        channel.publish(REPLICATION_TOPIC, b"two".to_vec()).await.unwrap();

        assert_eq!(recv_within(&mut rx).await, Some(b"one".to_vec()));
        assert_eq!(recv_within(&mut rx).await, Some(b"two".to_vec()));

        channel.unsubscribe(REPLICATION_TOPIC).await.unwrap();
        assert_eq!(broker.subscriber_count(REPLICATION_TOPIC), 0);
        assert!(!channel.deliver(REPLICATION_TOPIC, vec![0]).await);
    }
}
