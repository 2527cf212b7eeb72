use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable, totally ordered node identifier.
///
/// Generated once at startup. Only used to break ties during elections: the
/// lowest identifier wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub uuid::Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(uuid::Uuid::parse_str(s)?))
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    /// Startup only; the node does not answer probes yet.
    Discovering,
    Leader,
    Replica,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Discovering => "discovering",
            Role::Leader => "leader",
            Role::Replica => "replica",
        };
        f.write_str(label)
    }
}

/// Errors surfaced to callers of `write`, `history` and `probe`.
///
/// Callers treat every variant the same way: rediscover the leader and retry.
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum NodeError {
    #[error("node unreachable: {0}")]
    Unreachable(String),

    #[error("node is a replica and does not accept writes")]
    NotLeader,

    #[error("node has not finished discovery")]
    NotReady,
}

impl NodeError {
    pub fn unreachable(e: impl fmt::Display) -> Self {
        Self::Unreachable(e.to_string())
    }
}
