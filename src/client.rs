//! Reconnecting Client
//!
//! Talks to whichever node is registered under the well-known leader name. Any
//! failure triggers leader rediscovery, then the *same* call is retried; a
//! pending request is never dropped or replaced.

use std::sync::Arc;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::directory::client::Directory;
use crate::directory::types::{Endpoint, LEADER_NAME};
use crate::node::peer::PeerClient;

pub struct EchoClient {
    directory: Arc<dyn Directory>,
    peers: Arc<dyn PeerClient>,
    config: ClientConfig,
    leader: Option<Endpoint>,
}

impl EchoClient {
    pub fn new(
        directory: Arc<dyn Directory>,
        peers: Arc<dyn PeerClient>,
        config: ClientConfig,
    ) -> Self {
        Self {
            directory,
            peers,
            config,
            leader: None,
        }
    }

    /// Blocks until a leader registration is found.
    pub async fn connect(&mut self) -> Endpoint {
        loop {
            if let Some(leader) = self.try_discover().await {
                return leader;
            }
            tokio::time::sleep(self.config.reconnect_delay).await;
        }
    }

    pub fn leader(&self) -> Option<&Endpoint> {
        self.leader.as_ref()
    }

    /// Sends `content` to the leader and returns its echo reply.
    pub async fn echo(&mut self, content: &str) -> String {
        loop {
            let leader = self.current_leader().await;

            match self.peers.write(&leader, content).await {
                Ok(reply) => return reply,
                Err(e) => {
                    debug!("Echo via {} failed: {}", leader, e);
                    self.reconnect().await;
                }
            }
        }
    }

    /// Fetches the leader's message history.
    pub async fn history(&mut self) -> Vec<String> {
        loop {
            let leader = self.current_leader().await;

            match self.peers.history(&leader).await {
                Ok(messages) => return messages,
                Err(e) => {
                    debug!("History via {} failed: {}", leader, e);
                    self.reconnect().await;
                }
            }
        }
    }

    async fn current_leader(&mut self) -> Endpoint {
        match &self.leader {
            Some(leader) => leader.clone(),
            None => self.connect().await,
        }
    }

    async fn reconnect(&mut self) {
        self.leader = None;
        tokio::time::sleep(self.config.reconnect_delay).await;
        let leader = self.connect().await;
        info!("Reconnected to leader at {}", leader);
    }

    async fn try_discover(&mut self) -> Option<Endpoint> {
        let lookup = tokio::time::timeout(
            self.config.rpc_timeout,
            self.directory.lookup(LEADER_NAME),
        )
        .await;

        match lookup {
            Ok(Ok(Some(leader))) => {
                self.leader = Some(leader.clone());
                Some(leader)
            }
            Ok(Ok(None)) => {
                debug!("No leader registered yet");
                None
            }
            Ok(Err(e)) => {
                debug!("Leader lookup failed: {}", e);
                None
            }
            Err(_) => {
                debug!("Leader lookup timed out");
                None
            }
        }
    }
}
