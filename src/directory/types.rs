use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::node::types::NodeId;

/// Well-known name the current leader is registered under.
pub const LEADER_NAME: &str = "echo";
/// Prefix of every replica registration.
pub const REPLICA_PREFIX: &str = "replica_";

/// A reachable node address, as stored in the directory.
///
/// For HTTP deployments this is a base URL such as `http://127.0.0.1:7001`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Endpoint(pub String);

impl Endpoint {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    /// Joins a route path onto the endpoint's base URL.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.0.trim_end_matches('/'), path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn replica_name(id: &NodeId) -> String {
    format!("{}{}", REPLICA_PREFIX, id)
}

/// Recovers the node identifier from a replica registration name.
///
/// Names may carry a registry prefix (e.g. `//host:port/replica_<uuid>`), so the
/// prefix is searched for rather than anchored.
pub fn parse_replica_name(name: &str) -> Option<NodeId> {
    let start = name.find(REPLICA_PREFIX)? + REPLICA_PREFIX.len();
    NodeId::from_str(&name[start..]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_without_double_slash() {
        let endpoint = Endpoint::new("http://127.0.0.1:7001/");
        assert_eq!(endpoint.url("/probe"), "http://127.0.0.1:7001/probe");
    }

    #[test]
    fn test_replica_name_roundtrip() {
        let id = NodeId::new();
        let name = replica_name(&id);

        assert!(name.starts_with(REPLICA_PREFIX));
        assert_eq!(parse_replica_name(&name), Some(id));
    }

    #[test]
    fn test_parse_replica_name_rejects_other_names() {
        assert!(parse_replica_name(LEADER_NAME).is_none());
        assert!(parse_replica_name("replica_not-a-uuid").is_none());
    }

    #[test]
    fn test_parse_replica_name_with_registry_prefix() {
        let id = NodeId::new();
        let name = format!("//localhost:1099/{}", replica_name(&id));

        assert_eq!(parse_replica_name(&name), Some(id));
    }
}
