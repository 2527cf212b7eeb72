use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use super::client::Directory;
use super::types::Endpoint;

/// In-process name registry.
///
/// Serves as the registry server's state and as the directory of in-process
/// clusters. Setting it offline makes every call fail like an unreachable
/// registry would.
#[derive(Default)]
pub struct InMemoryDirectory {
    entries: DashMap<String, Endpoint>,
    offline: AtomicBool,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, name: &str, endpoint: Endpoint) {
        if let Some(previous) = self.entries.insert(name.to_string(), endpoint.clone()) {
            tracing::info!("Rebound {}: {} -> {}", name, previous, endpoint);
        } else {
            tracing::info!("Bound {} -> {}", name, endpoint);
        }
    }

    pub fn resolve(&self, name: &str) -> Option<Endpoint> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .entries
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("Directory unreachable"));
        }
        Ok(())
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn register(&self, name: &str, endpoint: &Endpoint) -> Result<()> {
        self.check_online()?;
        self.bind(name, endpoint.clone());
        Ok(())
    }

    async fn lookup(&self, name: &str) -> Result<Option<Endpoint>> {
        self.check_online()?;
        Ok(self.resolve(name))
    }

    async fn list(&self) -> Result<Vec<String>> {
        self.check_online()?;
        Ok(self.names())
    }
}
