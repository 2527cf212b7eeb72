//! Failure Detector
//!
//! Runs on replicas only: polls the leader registered under the well-known name
//! and hands over to the election protocol as soon as it stops answering.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::election::ElectionOutcome;
use super::service::EchoNode;
use super::types::Role;

impl EchoNode {
    /// Loops until this node stops being a replica.
    ///
    /// A deferred election that ends with a new leader resumes polling against
    /// that leader; a won election ends the loop.
    pub(crate) async fn failure_detection_loop(self: Arc<Self>) {
        info!("[REPLICA] Monitoring leader every {:?}", self.config.poll_interval);

        loop {
            if self.role().await != Role::Replica {
                break;
            }

            if self.find_live_leader().await.is_some() {
                tokio::time::sleep(self.config.poll_interval).await;
                continue;
            }

            warn!("[REPLICA] Leader failed! Starting election");

            match self.run_election().await {
                ElectionOutcome::Won | ElectionOutcome::NotReplica => break,
                ElectionOutcome::LeaderFound(leader) => {
                    info!("[REPLICA] Resuming leader monitoring against {}", leader);
                }
            }
        }

        debug!("Failure detector of {} stopped", self.id);
    }
}
