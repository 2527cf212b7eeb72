use anyhow::Result;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::peer::PeerClient;
use super::types::{NodeError, NodeId, Role};
use crate::config::NodeConfig;
use crate::directory::client::Directory;
use crate::directory::types::{Endpoint, LEADER_NAME, replica_name};
use crate::messages::log::MessageLog;
use crate::replication::channel::{
    DeliveryHandler, REPLICATION_TOPIC, ReplicationChannel, delivery_handler,
};
use crate::replication::event::ReplicationEvent;

/// Role and log, always read and mutated together.
struct NodeState {
    role: Role,
    log: MessageLog,
}

pub struct EchoNode {
    pub id: NodeId,
    /// Address other nodes and clients reach this node at.
    pub endpoint: Endpoint,
    pub(crate) config: NodeConfig,
    pub(crate) directory: Arc<dyn Directory>,
    pub(crate) channel: Arc<dyn ReplicationChannel>,
    pub(crate) peers: Arc<dyn PeerClient>,
    state: RwLock<NodeState>,
    detector: Mutex<Option<JoinHandle<()>>>,
}

impl EchoNode {
    pub fn new(
        endpoint: Endpoint,
        config: NodeConfig,
        directory: Arc<dyn Directory>,
        channel: Arc<dyn ReplicationChannel>,
        peers: Arc<dyn PeerClient>,
    ) -> Arc<Self> {
        Self::with_id(NodeId::new(), endpoint, config, directory, channel, peers)
    }

    pub fn with_id(
        id: NodeId,
        endpoint: Endpoint,
        config: NodeConfig,
        directory: Arc<dyn Directory>,
        channel: Arc<dyn ReplicationChannel>,
        peers: Arc<dyn PeerClient>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            endpoint,
            config,
            directory,
            channel,
            peers,
            state: RwLock::new(NodeState {
                role: Role::Discovering,
                log: MessageLog::new(),
            }),
            detector: Mutex::new(None),
        })
    }

    pub async fn role(&self) -> Role {
        self.state.read().await.role
    }

    /// Runs discovery and settles the node into its first role.
    ///
    /// Calling it again once the node has a role is a no-op returning that role.
    pub async fn start(self: &Arc<Self>) -> Result<Role> {
        let current = self.role().await;
        if current != Role::Discovering {
            return Ok(current);
        }

        info!("Node {} at {} discovering leader", self.id, self.endpoint);

        match self.find_live_leader().await {
            Some(leader) => {
                self.join_as_replica(&leader).await?;
                Ok(Role::Replica)
            }
            None => {
                self.start_as_leader().await?;
                Ok(Role::Leader)
            }
        }
    }

    async fn start_as_leader(&self) -> Result<()> {
        let mut state = self.state.write().await;

        self.bounded(self.directory.register(LEADER_NAME, &self.endpoint))
            .await?;
        state.role = Role::Leader;

        info!(
            "No leader found. Node {} acting as leader ({} entries)",
            self.id,
            state.log.len()
        );
        Ok(())
    }

    async fn join_as_replica(self: &Arc<Self>, leader: &Endpoint) -> Result<()> {
        info!("Leader found at {}. Acting as replica", leader);

        let mut state = self.state.write().await;

        // Snapshot before subscribing; writes landing in between are lost.
        match tokio::time::timeout(self.config.rpc_timeout, self.peers.history(leader)).await {
            Ok(Ok(entries)) => {
                info!("History synchronized with leader ({} entries)", entries.len());
                state.log.replace(entries);
            }
            Ok(Err(e)) => warn!("Failed to synchronize history with leader: {}", e),
            Err(_) => warn!("Timed out synchronizing history with leader"),
        }

        let name = replica_name(&self.id);
        self.bounded(self.directory.register(&name, &self.endpoint))
            .await?;

        self.bounded(
            self.channel
                .subscribe(REPLICATION_TOPIC, self.replication_handler()),
        )
        .await?;
        info!("Registered as {} and subscribed to {}", name, REPLICATION_TOPIC);

        state.role = Role::Replica;
        drop(state);

        self.spawn_failure_detector();
        Ok(())
    }

    /// Accepts a client write. Only the leader accepts writes; it appends first,
    /// then publishes best-effort.
    pub async fn write(&self, content: String) -> Result<String, NodeError> {
        let mut state = self.state.write().await;

        match state.role {
            Role::Leader => {}
            Role::Replica => {
                debug!("Rejected write on replica: {}", content);
                return Err(NodeError::NotLeader);
            }
            Role::Discovering => return Err(NodeError::NotReady),
        }

        state.log.append(content.clone());
        info!("[LEADER] Message received: {}", content);

        // Published under the lock so replicas see the leader's append order.
        self.publish(&content).await;

        Ok(format!("Echo (leader): {}", content))
    }

    async fn publish(&self, content: &str) {
        let payload = match ReplicationEvent::new(self.id, content.to_string()).encode() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to encode replication event: {}", e);
                return;
            }
        };

        match self
            .bounded(self.channel.publish(REPLICATION_TOPIC, payload))
            .await
        {
            Ok(()) => debug!("Message published on {}", REPLICATION_TOPIC),
            Err(e) => warn!("Failed to publish message, replicas will miss it: {}", e),
        }
    }

    /// Copy of the local log in insertion order.
    pub async fn history(&self) -> Vec<String> {
        self.state.read().await.log.snapshot()
    }

    /// Liveness signal. False until discovery completes.
    pub async fn probe(&self) -> bool {
        self.role().await != Role::Discovering
    }

    /// Appends one delivered replication payload. Ignored unless this node is a
    /// replica.
    pub async fn apply_replicated(&self, payload: &[u8]) {
        let event = match ReplicationEvent::decode(payload) {
            Ok(event) => event,
            Err(e) => {
                warn!("Dropping undecodable replication payload: {}", e);
                return;
            }
        };

        let mut state = self.state.write().await;
        if state.role != Role::Replica {
            debug!("Ignoring replicated message while {}", state.role);
            return;
        }

        debug!(
            "[REPLICA] Replicated message received from {}: {}",
            event.origin, event.content
        );
        state.log.append(event.content);
    }

    fn replication_handler(self: &Arc<Self>) -> DeliveryHandler {
        let node = Arc::downgrade(self);
        delivery_handler(move |payload| {
            let node = node.clone();
            async move {
                if let Some(node) = node.upgrade() {
                    node.apply_replicated(&payload).await;
                }
            }
        })
    }

    /// Switches a replica to leader, atomically with respect to every other
    /// reader of the role.
    ///
    /// Returns `Ok(false)` when the node was not a replica.
    pub(crate) async fn become_leader(&self) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.role != Role::Replica {
            return Ok(false);
        }

        self.bounded(self.directory.register(LEADER_NAME, &self.endpoint))
            .await?;

        if let Err(e) = self.bounded(self.channel.unsubscribe(REPLICATION_TOPIC)).await {
            warn!("Failed to unsubscribe from {}: {}", REPLICATION_TOPIC, e);
        }

        state.role = Role::Leader;
        info!(
            "ELECTION: node {} is now the leader ({} entries kept)",
            self.id,
            state.log.len()
        );
        Ok(true)
    }

    fn spawn_failure_detector(self: &Arc<Self>) {
        let node = self.clone();
        let handle = tokio::spawn(async move {
            node.failure_detection_loop().await;
        });

        if let Ok(mut slot) = self.detector.lock()
            && let Some(previous) = slot.replace(handle)
        {
            previous.abort();
        }
    }

    /// Stops background activity. Used on process exit.
    pub async fn shutdown(&self) {
        let handle = match self.detector.lock() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            handle.abort();
        }

        if self.role().await == Role::Replica
            && let Err(e) = self.bounded(self.channel.unsubscribe(REPLICATION_TOPIC)).await
        {
            debug!("Unsubscribe on shutdown failed: {}", e);
        }

        info!("Node {} stopped", self.id);
    }

    /// Looks up the well-known leader name and probes it.
    ///
    /// Lookup errors, missing names, dead endpoints and this node's own endpoint
    /// all count as "no leader".
    pub(crate) async fn find_live_leader(&self) -> Option<Endpoint> {
        let endpoint = match self.bounded(self.directory.lookup(LEADER_NAME)).await {
            Ok(Some(endpoint)) => endpoint,
            Ok(None) => return None,
            Err(e) => {
                debug!("Leader lookup failed: {}", e);
                return None;
            }
        };

        if endpoint == self.endpoint {
            return None;
        }

        if self.probe_peer(&endpoint).await {
            Some(endpoint)
        } else {
            debug!("Leader registration {} does not answer", endpoint);
            None
        }
    }

    pub(crate) async fn probe_peer(&self, endpoint: &Endpoint) -> bool {
        matches!(
            tokio::time::timeout(self.config.rpc_timeout, self.peers.probe(endpoint)).await,
            Ok(Ok(true))
        )
    }

    /// Bounds a remote call by the configured RPC timeout.
    pub(crate) async fn bounded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.config.rpc_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(anyhow::anyhow!(
                "timed out after {:?}",
                self.config.rpc_timeout
            )),
        }
    }
}
