//! Timing configuration for nodes and clients.
//!
//! Defaults match a local deployment; tests shrink them to keep multi-node
//! scenarios fast.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NodeConfig {
    /// Delay between two failure detector probes of the leader.
    pub poll_interval: Duration,
    /// Delay before retrying an election this node deferred.
    pub election_backoff: Duration,
    /// Upper bound for every directory call and peer probe.
    pub rpc_timeout: Duration,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            election_backoff: Duration::from_millis(500),
            rpc_timeout: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Delay between two leader discovery attempts.
    pub reconnect_delay: Duration,
    pub rpc_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(500),
            rpc_timeout: Duration::from_secs(2),
        }
    }
}
