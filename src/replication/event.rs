use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::node::types::NodeId;

/// One accepted write, broadcast once by the leader that accepted it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplicationEvent {
    pub origin: NodeId,
    pub content: String,
}

impl ReplicationEvent {
    pub fn new(origin: NodeId, content: String) -> Self {
        Self { origin, content }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn decode(payload: &[u8]) -> Result<Self> {
        Ok(bincode::deserialize(payload)?)
    }
}
