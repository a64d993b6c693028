use crate::config::{ResourceTemplate, RuntimeConfig};
use crate::error::Result;
use crate::runtime::{BackendKind, BackendRef, DiscoveredUnit, Provisioned, RuntimeBackend};
use async_trait::async_trait;
use std::time::Duration;

/// In-memory backend used when no container runtime is reachable.
///
/// Deploys take an artificial delay and get an address derived from the
/// registry size, so the n-th resource lands on `<subnet>(n + 10)`.
pub struct SimulatedBackend {
    delay: Duration,
    subnet: String,
}

impl SimulatedBackend {
    pub fn new(config: &RuntimeConfig) -> Self {
        Self {
            delay: config.simulated_delay(),
            subnet: config.simulated_subnet.clone(),
        }
    }

    /// Address handed to the resource deployed at `ordinal`.
    pub fn address_for(&self, ordinal: usize) -> String {
        format!("{}{}", self.subnet, ordinal + 10)
    }
}

#[async_trait]
impl RuntimeBackend for SimulatedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Simulated
    }

    async fn discover(&self, _name_prefixes: &[String]) -> Result<Vec<DiscoveredUnit>> {
        Ok(Vec::new())
    }

    async fn provision(&self, name: &str, _template: &ResourceTemplate, ordinal: usize) -> Provisioned {
        tracing::info!(resource = %name, "Simulating deployment");
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Provisioned::Simulated {
            network_address: self.address_for(ordinal),
        }
    }

    // Simulated resources never carry a backend ref, so these are no-ops.

    async fn stop(&self, _unit: &BackendRef) -> Result<()> {
        Ok(())
    }

    async fn start(&self, _unit: &BackendRef) -> Result<()> {
        Ok(())
    }

    async fn halt(&self, _unit: &BackendRef) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, _unit: &BackendRef) -> Result<()> {
        Ok(())
    }
}
