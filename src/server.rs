//! Route tables for the two process kinds.

use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::sync::Arc;

use crate::directory::handlers::{handle_list, handle_lookup, handle_register};
use crate::directory::memory::InMemoryDirectory;
use crate::directory::protocol::{ENDPOINT_LIST, ENDPOINT_LOOKUP, ENDPOINT_REGISTER};
use crate::node::handlers::{handle_deliver, handle_echo, handle_history, handle_probe};
use crate::node::protocol::{ENDPOINT_ECHO, ENDPOINT_HISTORY, ENDPOINT_PROBE};
use crate::node::service::EchoNode;
use crate::replication::broker::Broker;
use crate::replication::handlers::{handle_publish, handle_subscribe, handle_unsubscribe};
use crate::replication::http::HttpChannel;
use crate::replication::protocol::{
    ENDPOINT_DELIVER, ENDPOINT_PUBLISH, ENDPOINT_SUBSCRIBE, ENDPOINT_UNSUBSCRIBE,
};

/// Public node surface plus the broker delivery callback.
pub fn node_router(node: Arc<EchoNode>, channel: Arc<HttpChannel>) -> Router {
    Router::new()
        .route(ENDPOINT_ECHO, post(handle_echo))
        .route(ENDPOINT_HISTORY, get(handle_history))
        .route(ENDPOINT_PROBE, get(handle_probe))
        .route(ENDPOINT_DELIVER, post(handle_deliver))
        .layer(Extension(node))
        .layer(Extension(channel))
}

/// Directory and broker, hosted by the registry process.
pub fn registry_router(directory: Arc<InMemoryDirectory>, broker: Arc<Broker>) -> Router {
    Router::new()
        .route(ENDPOINT_REGISTER, post(handle_register))
        .route(&format!("{}/:name", ENDPOINT_LOOKUP), get(handle_lookup))
        .route(ENDPOINT_LIST, get(handle_list))
        .route(ENDPOINT_PUBLISH, post(handle_publish))
        .route(ENDPOINT_SUBSCRIBE, post(handle_subscribe))
        .route(ENDPOINT_UNSUBSCRIBE, post(handle_unsubscribe))
        .layer(Extension(directory))
        .layer(Extension(broker))
}
