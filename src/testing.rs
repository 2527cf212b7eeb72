//! In-process cluster harness shared by the module tests.
//!
//! Nodes talk through the in-memory directory and broker; peer calls go through
//! `LocalNetwork`, which can take an endpoint down to simulate a killed process.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::future::Future;
use std::sync::{Arc, Weak};
use std::time::Duration;
use uuid::Uuid;

use crate::client::EchoClient;
use crate::config::{ClientConfig, NodeConfig};
use crate::directory::memory::InMemoryDirectory;
use crate::directory::types::Endpoint;
use crate::node::peer::PeerClient;
use crate::node::service::EchoNode;
use crate::node::types::{NodeError, NodeId};
use crate::replication::memory::{InMemoryBroker, LocalChannel};

#[derive(Default)]
pub(crate) struct LocalNetwork {
    nodes: DashMap<Endpoint, Weak<EchoNode>>,
    down: DashSet<Endpoint>,
    /// Endpoints that answer probes but fail history pulls.
    broken_history: DashSet<Endpoint>,
}

impl LocalNetwork {
    pub(crate) fn attach(&self, node: &Arc<EchoNode>) {
        self.nodes.insert(node.endpoint.clone(), Arc::downgrade(node));
    }

    pub(crate) fn take_down(&self, endpoint: &Endpoint) {
        self.down.insert(endpoint.clone());
    }

    pub(crate) fn fail_history(&self, endpoint: &Endpoint) {
        self.broken_history.insert(endpoint.clone());
    }

    fn node(&self, endpoint: &Endpoint) -> Result<Arc<EchoNode>, NodeError> {
        if self.down.contains(endpoint) {
            return Err(NodeError::Unreachable(format!("{} is down", endpoint)));
        }
        self.nodes
            .get(endpoint)
            .and_then(|node| node.value().upgrade())
            .ok_or_else(|| NodeError::Unreachable(format!("{} is unknown", endpoint)))
    }
}

#[async_trait]
impl PeerClient for LocalNetwork {
    async fn probe(&self, endpoint: &Endpoint) -> Result<bool, NodeError> {
        let node = self.node(endpoint)?;
        Ok(node.probe().await)
    }

    async fn history(&self, endpoint: &Endpoint) -> Result<Vec<String>, NodeError> {
        let node = self.node(endpoint)?;
        if self.broken_history.contains(endpoint) {
            return Err(NodeError::Unreachable(format!("{} dropped the history call", endpoint)));
        }
        Ok(node.history().await)
    }

    async fn write(&self, endpoint: &Endpoint, content: &str) -> Result<String, NodeError> {
        let node = self.node(endpoint)?;
        node.write(content.to_string()).await
    }
}

pub(crate) struct TestCluster {
    pub(crate) directory: Arc<InMemoryDirectory>,
    pub(crate) broker: Arc<InMemoryBroker>,
    pub(crate) network: Arc<LocalNetwork>,
    pub(crate) config: NodeConfig,
}

impl TestCluster {
    pub(crate) fn new() -> Self {
        Self {
            directory: Arc::new(InMemoryDirectory::new()),
            broker: InMemoryBroker::new(),
            network: Arc::new(LocalNetwork::default()),
            config: NodeConfig {
                poll_interval: Duration::from_millis(20),
                election_backoff: Duration::from_millis(50),
                rpc_timeout: Duration::from_millis(200),
            },
        }
    }

    pub(crate) fn node_id(n: u128) -> NodeId {
        NodeId(Uuid::from_u128(n))
    }

    pub(crate) fn endpoint(n: u128) -> Endpoint {
        Endpoint::new(format!("mem://node-{}", n))
    }

    /// Builds node `n` without running discovery.
    pub(crate) fn spawn_node(&self, n: u128) -> Arc<EchoNode> {
        let node = EchoNode::with_id(
            Self::node_id(n),
            Self::endpoint(n),
            self.config.clone(),
            self.directory.clone(),
            Arc::new(LocalChannel::new(self.broker.clone())),
            self.network.clone(),
        );
        self.network.attach(&node);
        node
    }

    pub(crate) async fn start_node(&self, n: u128) -> Arc<EchoNode> {
        let node = self.spawn_node(n);
        node.start().await.expect("discovery failed");
        node
    }

    /// Makes the node unreachable and stops its background work.
    pub(crate) async fn kill(&self, node: &Arc<EchoNode>) {
        self.network.take_down(&node.endpoint);
        node.shutdown().await;
    }

    pub(crate) fn client(&self) -> EchoClient {
        EchoClient::new(
            self.directory.clone(),
            self.network.clone(),
            ClientConfig {
                reconnect_delay: Duration::from_millis(20),
                rpc_timeout: Duration::from_millis(200),
            },
        )
    }
}

/// Polls `check` until it holds or `within` elapses.
pub(crate) async fn eventually<F, Fut>(within: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + within;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

pub(crate) const WAIT: Duration = Duration::from_secs(3);

pub(crate) async fn wait_for_history(node: &EchoNode, expected: &[&str]) -> bool {
    eventually(WAIT, || async move { node.history().await == expected }).await
}

pub(crate) async fn wait_for_role(node: &EchoNode, role: crate::node::types::Role) -> bool {
    eventually(WAIT, || async move { node.role().await == role }).await
}
