//! Replicated Echo Cluster Library
//!
//! A small replicated service: one node is the authoritative writer of an
//! append-only message log, the others hold a best-effort copy and take over when
//! the leader disappears.
//!
//! ## Architecture Modules
//! - **`node`**: Role state machine, failure detector and election protocol.
//! - **`messages`**: The per-node append-only message log.
//! - **`directory`**: Name -> endpoint registry used for discovery.
//! - **`replication`**: Publish/subscribe channel carrying writes to replicas.
//! - **`client`**: Reconnecting client used by the console shell.
//! - **`server`**: HTTP route tables for node and registry processes.
//! - **`config`**: Timing knobs for nodes and clients.

pub mod client;
pub mod config;
pub mod directory;
pub mod messages;
pub mod node;
pub mod replication;
pub mod server;

#[cfg(test)]
pub(crate) mod testing;

/// HTTP client for intra-cluster traffic.
///
/// Cluster addresses are direct, so environment proxies are bypassed.
pub(crate) fn cluster_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .unwrap_or_default()
}
