use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;

use super::broker::Broker;
use super::protocol::{
    PublishRequest, PublishResponse, SubscribeRequest, SubscriptionResponse, UnsubscribeRequest,
};

pub async fn handle_publish(
    Extension(broker): Extension<Arc<Broker>>,
    Json(req): Json<PublishRequest>,
) -> (StatusCode, Json<PublishResponse>) {
    let queued = broker.publish(&req.topic, req.payload);
    (StatusCode::OK, Json(PublishResponse { queued }))
}

pub async fn handle_subscribe(
    Extension(broker): Extension<Arc<Broker>>,
    Json(req): Json<SubscribeRequest>,
) -> (StatusCode, Json<SubscriptionResponse>) {
    if req.topic.is_empty() || req.callback.is_empty() {
        tracing::warn!("Rejected subscription from {}", req.subscriber);
        return (
            StatusCode::BAD_REQUEST,
            Json(SubscriptionResponse { success: false }),
        );
    }

    broker.subscribe(&req.topic, &req.subscriber, req.callback);
    (StatusCode::OK, Json(SubscriptionResponse { success: true }))
}

pub async fn handle_unsubscribe(
    Extension(broker): Extension<Arc<Broker>>,
    Json(req): Json<UnsubscribeRequest>,
) -> (StatusCode, Json<SubscriptionResponse>) {
    let success = broker.unsubscribe(&req.topic, &req.subscriber);
    (StatusCode::OK, Json(SubscriptionResponse { success }))
}
