use axum::{Json, extract::Extension, http::StatusCode};
use std::sync::Arc;

use super::protocol::{EchoRequest, EchoResponse, HistoryResponse, ProbeResponse};
use super::service::EchoNode;
use super::types::NodeError;
use crate::replication::http::HttpChannel;
use crate::replication::protocol::{DeliverRequest, DeliverResponse};

pub async fn handle_echo(
    Extension(node): Extension<Arc<EchoNode>>,
    Json(req): Json<EchoRequest>,
) -> Result<Json<EchoResponse>, (StatusCode, Json<NodeError>)> {
    match node.write(req.content).await {
        Ok(reply) => Ok(Json(EchoResponse { reply })),
        Err(e) => {
            tracing::debug!("Write refused: {}", e);
            Err((StatusCode::SERVICE_UNAVAILABLE, Json(e)))
        }
    }
}

pub async fn handle_history(
    Extension(node): Extension<Arc<EchoNode>>,
) -> (StatusCode, Json<HistoryResponse>) {
    let messages = node.history().await;
    (StatusCode::OK, Json(HistoryResponse { messages }))
}

pub async fn handle_probe(
    Extension(node): Extension<Arc<EchoNode>>,
) -> (StatusCode, Json<ProbeResponse>) {
    let alive = node.probe().await;
    (StatusCode::OK, Json(ProbeResponse { alive }))
}

/// Broker callback: routes a delivered payload to the subscribed handler.
pub async fn handle_deliver(
    Extension(channel): Extension<Arc<HttpChannel>>,
    Json(req): Json<DeliverRequest>,
) -> (StatusCode, Json<DeliverResponse>) {
    if channel.deliver(&req.topic, req.payload).await {
        (StatusCode::OK, Json(DeliverResponse { accepted: true }))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(DeliverResponse { accepted: false }),
        )
    }
}
