//! Node Network Protocol
//!
//! Public request/response surface of a node (`write`, `history`, `probe`).
//! Failures are answered with `503` and a JSON-encoded `NodeError` body.

use serde::{Deserialize, Serialize};

pub const ENDPOINT_ECHO: &str = "/echo";
pub const ENDPOINT_HISTORY: &str = "/history";
pub const ENDPOINT_PROBE: &str = "/probe";

#[derive(Debug, Serialize, Deserialize)]
pub struct EchoRequest {
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EchoResponse {
    pub reply: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProbeResponse {
    pub alive: bool,
}
