use crate::config::{ResourceTemplate, RuntimeConfig};
use crate::error::{Error, Result};
use crate::runtime::{
    ADDRESS_UNAVAILABLE, BackendKind, BackendRef, ContainerRuntime, DiscoveredUnit, Provisioned,
    RuntimeBackend,
};
use crate::server::ResourceStatus;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Map a runtime's free-form status text onto a resource status.
///
/// Running-like (`Up ...`) becomes `running`, exited-like becomes
/// `stopped`, anything else (created, dead, removing) `terminated`.
pub fn classify_status(status_text: &str) -> ResourceStatus {
    if status_text.contains("Up") {
        ResourceStatus::Running
    } else if status_text.contains("Exited") {
        ResourceStatus::Stopped
    } else {
        ResourceStatus::Terminated
    }
}

/// Backend delegating to an external container runtime.
pub struct RealBackend {
    runtime: Arc<dyn ContainerRuntime>,
    stop_timeout: Duration,
    stop_grace: Duration,
}

impl RealBackend {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: &RuntimeConfig) -> Self {
        Self {
            runtime,
            stop_timeout: config.stop_timeout(),
            stop_grace: config.stop_grace(),
        }
    }

    async fn resolve_address(&self, id: &str) -> String {
        match self.runtime.inspect_address(id).await {
            Ok(Some(address)) => address,
            Ok(None) => ADDRESS_UNAVAILABLE.to_string(),
            Err(e) => {
                tracing::warn!(unit = %id, error = %e, "Failed to resolve unit address");
                ADDRESS_UNAVAILABLE.to_string()
            }
        }
    }
}

#[async_trait]
impl RuntimeBackend for RealBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Real
    }

    async fn discover(&self, name_prefixes: &[String]) -> Result<Vec<DiscoveredUnit>> {
        let units = self
            .runtime
            .list_units(name_prefixes)
            .await
            .map_err(|e| match e {
                Error::Reconciliation(_) => e,
                other => Error::Reconciliation(other.to_string()),
            })?;

        let mut discovered = Vec::with_capacity(units.len());
        // The runtime's name filter is a substring match
        for unit in units
            .into_iter()
            .filter(|unit| name_prefixes.iter().any(|p| unit.name.starts_with(p.as_str())))
        {
            let status = classify_status(&unit.status_text);
            let network_address = if status == ResourceStatus::Running {
                self.resolve_address(&unit.id).await
            } else {
                ADDRESS_UNAVAILABLE.to_string()
            };

            discovered.push(DiscoveredUnit {
                name: unit.name,
                backend_ref: BackendRef::new(unit.id),
                status,
                network_address,
                image: unit.image,
                created_at: unit.created_at,
            });
        }

        Ok(discovered)
    }

    async fn provision(&self, name: &str, template: &ResourceTemplate, _ordinal: usize) -> Provisioned {
        match self
            .runtime
            .create_and_start(name, &template.image, &template.command)
            .await
        {
            Ok(id) => {
                let network_address = self.resolve_address(&id).await;
                Provisioned::Real {
                    backend_ref: BackendRef::new(id),
                    network_address,
                }
            }
            Err(e) => {
                tracing::error!(resource = %name, error = %e, "Failed to deploy container");
                Provisioned::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn stop(&self, unit: &BackendRef) -> Result<()> {
        match tokio::time::timeout(
            self.stop_timeout,
            self.runtime.stop(unit.as_str(), Some(self.stop_grace)),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "Stopping {} took longer than {:?}",
                unit.short(),
                self.stop_timeout
            ))),
        }
    }

    async fn start(&self, unit: &BackendRef) -> Result<()> {
        self.runtime.start(unit.as_str()).await
    }

    async fn halt(&self, unit: &BackendRef) -> Result<()> {
        self.runtime.stop(unit.as_str(), None).await
    }

    async fn remove(&self, unit: &BackendRef) -> Result<()> {
        self.runtime.remove(unit.as_str(), true).await
    }
}
