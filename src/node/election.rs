//! Election Protocol
//!
//! Bully-style tie-break keyed on node identifiers: a replica only claims the
//! well-known name once no replica with a lower identifier answers a probe.
//! Deferred rounds retry after a fixed backoff, inside a single loop.

use anyhow::Result;
use tracing::{info, warn};

use super::service::EchoNode;
use super::types::{NodeId, Role};
use crate::directory::types::{Endpoint, LEADER_NAME, parse_replica_name};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElectionOutcome {
    /// This node took over the well-known name.
    Won,
    /// Another node already answers under the well-known name.
    LeaderFound(Endpoint),
    /// The node was no longer a replica when the round started.
    NotReplica,
}

impl EchoNode {
    /// Runs rounds until this node wins or observes a live leader.
    pub async fn run_election(&self) -> ElectionOutcome {
        let mut round = 0u32;

        loop {
            round += 1;

            if self.role().await != Role::Replica {
                return ElectionOutcome::NotReplica;
            }

            if let Some(leader) = self.find_live_leader().await {
                info!("[REPLICA] New leader {} already active, aborting election", leader);
                return ElectionOutcome::LeaderFound(leader);
            }

            match self.live_lower_competitor().await {
                Ok(None) => match self.become_leader().await {
                    Ok(true) => {
                        self.check_split_leadership().await;
                        return ElectionOutcome::Won;
                    }
                    Ok(false) => return ElectionOutcome::NotReplica,
                    Err(e) => warn!("Election round {}: failed to claim leadership: {}", round, e),
                },
                Ok(Some(competitor)) => {
                    info!(
                        "[REPLICA] Election round {}: replica {} has a lower id and is alive, waiting",
                        round, competitor
                    );
                }
                Err(e) => warn!("Election round {}: cannot enumerate replicas: {}", round, e),
            }

            tokio::time::sleep(self.config.election_backoff).await;
        }
    }

    /// First live replica whose identifier is lower than ours, if any.
    async fn live_lower_competitor(&self) -> Result<Option<NodeId>> {
        let names = self.bounded(self.directory.list()).await?;

        for (id, name) in lower_candidates(&self.id, &names) {
            let endpoint = match self.bounded(self.directory.lookup(&name)).await {
                Ok(Some(endpoint)) => endpoint,
                _ => continue,
            };

            if self.probe_peer(&endpoint).await {
                return Ok(Some(id));
            }
        }

        Ok(None)
    }

    /// Detects, but does not resolve, a concurrent win by another node.
    ///
    /// Returns `true` when the well-known name resolves to another endpoint.
    pub(crate) async fn check_split_leadership(&self) -> bool {
        if let Ok(Some(registered)) = self.bounded(self.directory.lookup(LEADER_NAME)).await
            && registered != self.endpoint
        {
            warn!(
                "Split leadership: {} believes it leads but {} is registered as {}",
                self.endpoint, registered, LEADER_NAME
            );
            return true;
        }
        false
    }
}

/// Replica registrations with an identifier strictly lower than `own`, lowest
/// first.
pub fn lower_candidates(own: &NodeId, names: &[String]) -> Vec<(NodeId, String)> {
    let mut candidates: Vec<(NodeId, String)> = names
        .iter()
        .filter_map(|name| parse_replica_name(name).map(|id| (id, name.clone())))
        .filter(|(id, _)| id < own)
        .collect();

    candidates.sort_by_key(|(id, _)| *id);
    candidates
}
