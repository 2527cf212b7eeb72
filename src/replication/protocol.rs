//! Broker Network Protocol
//!
//! Routes served by the registry's broker, plus the delivery route every
//! subscribed node serves.

use serde::{Deserialize, Serialize};

pub const ENDPOINT_PUBLISH: &str = "/pubsub/publish";
pub const ENDPOINT_SUBSCRIBE: &str = "/pubsub/subscribe";
pub const ENDPOINT_UNSUBSCRIBE: &str = "/pubsub/unsubscribe";
/// Served by subscribers; the broker POSTs each payload here.
pub const ENDPOINT_DELIVER: &str = "/internal/deliver";

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishRequest {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PublishResponse {
    /// Number of subscribers the payload was queued for.
    pub queued: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscribeRequest {
    pub topic: String,
    /// Stable id of the subscribing client; re-subscribing replaces the old entry.
    pub subscriber: String,
    /// Full URL the broker delivers to.
    pub callback: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UnsubscribeRequest {
    pub topic: String,
    pub subscriber: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubscriptionResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeliverRequest {
    pub topic: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeliverResponse {
    pub accepted: bool,
}
