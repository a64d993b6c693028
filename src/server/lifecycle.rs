use crate::config::{ResourceTemplate, TemplateCatalog};
use crate::error::{Error, Result};
use crate::runtime::{BackendKind, Provisioned, RuntimeBackend};
use crate::server::{Resource, ResourceStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// Number of lifecycle events retained, oldest dropped first.
const MAX_EVENTS: usize = 1000;

/// Resource lifecycle event types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// Resource deployed and running
    Deployed,
    /// Backend refused to create the resource
    DeployFailed,
    /// Pre-existing unit adopted at startup
    Reconciled,
    /// Resource stopped
    Stopped,
    /// Stopped resource started again
    Restarted,
    /// Resource terminated
    Terminated,
    /// Resource removed from the registry
    Deleted,
}

/// Resource lifecycle event
#[derive(Debug, Clone, Serialize)]
pub struct ResourceEvent {
    /// Resource name
    pub name: String,
    /// Event type
    pub event: LifecycleEvent,
    /// Event timestamp
    pub timestamp: DateTime<Utc>,
    /// Event details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Owns the resource registry and drives resources through their states.
///
/// Registry changes are applied before the backend is contacted, and
/// backend failures on stop, restart, terminate and delete are logged
/// without rolling the registry back. Operations take `&mut self`; wrap
/// the manager in a lock to share it.
pub struct ResourceLifecycleManager {
    catalog: TemplateCatalog,
    backend: Box<dyn RuntimeBackend>,
    registry: Vec<Resource>,
    events: VecDeque<ResourceEvent>,
}

impl ResourceLifecycleManager {
    /// Create a manager and adopt pre-existing units from a real backend.
    ///
    /// A failed or malformed listing is logged and leaves the registry
    /// empty; construction itself never fails.
    pub async fn new(catalog: TemplateCatalog, backend: Box<dyn RuntimeBackend>) -> Self {
        let mut manager = Self::empty(catalog, backend);
        manager.reconcile().await;
        manager
    }

    /// Create a manager with an empty registry, skipping reconciliation.
    pub fn empty(catalog: TemplateCatalog, backend: Box<dyn RuntimeBackend>) -> Self {
        Self {
            catalog,
            backend,
            registry: Vec::new(),
            events: VecDeque::new(),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn reconcile(&mut self) {
        if self.backend.kind() != BackendKind::Real {
            return;
        }

        let prefixes: Vec<String> = self.catalog.type_names().map(str::to_string).collect();
        let units = match self.backend.discover(&prefixes).await {
            Ok(units) => units,
            Err(e) => {
                tracing::error!(error = %e, "Error loading existing containers");
                return;
            }
        };

        let reconciled_at = Utc::now();
        for unit in units {
            let Some(template) = self
                .catalog
                .infer_type(&unit.name)
                .and_then(|type_name| self.catalog.get(type_name))
            else {
                tracing::warn!(unit = %unit.name, "No resource type matches unit, skipping");
                continue;
            };

            if self.position(&unit.name).is_some() {
                tracing::warn!(unit = %unit.name, "Duplicate unit name in listing, skipping");
                continue;
            }

            let deployed_at = unit.created_at.unwrap_or(reconciled_at);
            let resource = Resource::reconciled(unit, template, deployed_at);
            tracing::info!(
                resource = %resource.name(),
                status = %resource.status(),
                "Loaded existing container"
            );

            let details = Some(resource.status().to_string());
            self.record(resource.name().to_string(), LifecycleEvent::Reconciled, details);
            self.registry.push(resource);
        }
    }

    /// Deploy one resource of `type_name`.
    ///
    /// With an explicit `id` the resulting name must be free. Without one,
    /// the current unix time in seconds is used, bumped until unused.
    /// A backend failure still registers the resource, with status `failed`.
    ///
    /// # Errors
    ///
    /// * [`Error::UnknownResourceType`] if the catalog has no such type
    /// * [`Error::ResourceExists`] if the formatted name is taken
    #[tracing::instrument(skip(self))]
    pub async fn deploy(&mut self, type_name: &str, id: Option<&str>) -> Result<Resource> {
        let template = match self.catalog.get(type_name) {
            Some(template) => template.clone(),
            None => {
                tracing::error!("Unknown resource type: {}", type_name);
                return Err(Error::UnknownResourceType(type_name.to_string()));
            }
        };

        let name = match id {
            Some(id) => {
                let name = template.format_name(id);
                if self.position(&name).is_some() {
                    return Err(Error::ResourceExists(name));
                }
                name
            }
            None => self.derive_name(&template),
        };

        tracing::info!(resource = %name, "Deploying {}", type_name);
        let mut resource = Resource::deploying(name, &template, Utc::now());

        let ordinal = self.registry.len();
        let provisioned = self.backend.provision(resource.name(), &template, ordinal).await;
        let failure = match &provisioned {
            Provisioned::Failed { reason } => Some(reason.clone()),
            _ => None,
        };
        resource.settle(provisioned);

        match failure {
            Some(reason) => {
                self.record(resource.name().to_string(), LifecycleEvent::DeployFailed, Some(reason));
            }
            None => {
                tracing::info!(
                    resource = %resource.name(),
                    address = %resource.network_address(),
                    is_real = resource.is_real(),
                    "Resource deployed"
                );
                let details = Some(resource.network_address().to_string());
                self.record(resource.name().to_string(), LifecycleEvent::Deployed, details);
            }
        }

        self.registry.push(resource.clone());
        Ok(resource)
    }

    /// Deploy one resource per catalog type, in catalog order.
    pub async fn deploy_all(&mut self) -> Vec<Resource> {
        let type_names: Vec<String> = self.catalog.type_names().map(str::to_string).collect();
        let mut deployed = Vec::with_capacity(type_names.len());

        for type_name in type_names {
            match self.deploy(&type_name, None).await {
                Ok(resource) => deployed.push(resource),
                Err(e) => tracing::error!(resource_type = %type_name, error = %e, "Deploy failed"),
            }
        }

        deployed
    }

    /// Stop a running resource.
    ///
    /// Returns `false` without side effects when the resource is missing
    /// or not running.
    #[tracing::instrument(skip(self))]
    pub async fn stop(&mut self, name: &str) -> bool {
        let Some(index) = self.position_with_status(name, ResourceStatus::Running) else {
            return false;
        };

        self.registry[index].set_status(ResourceStatus::Stopped);
        let backend_ref = self.registry[index].backend_ref().cloned();
        self.record(name.to_string(), LifecycleEvent::Stopped, None);
        tracing::info!(resource = %name, "Server stopped");

        if let Some(unit) = backend_ref {
            match self.backend.stop(&unit).await {
                Ok(()) => tracing::info!(unit = %unit.short(), "Container stopped"),
                Err(e) => tracing::error!(unit = %unit.short(), error = %e, "Error stopping container"),
            }
        }

        true
    }

    /// Restart a stopped resource.
    ///
    /// Returns `false` without side effects when the resource is missing
    /// or not stopped.
    #[tracing::instrument(skip(self))]
    pub async fn restart(&mut self, name: &str) -> bool {
        let Some(index) = self.position_with_status(name, ResourceStatus::Stopped) else {
            return false;
        };

        self.registry[index].set_status(ResourceStatus::Running);
        let backend_ref = self.registry[index].backend_ref().cloned();
        self.record(name.to_string(), LifecycleEvent::Restarted, None);
        tracing::info!(resource = %name, "Server restarted");

        if let Some(unit) = backend_ref {
            match self.backend.start(&unit).await {
                Ok(()) => tracing::info!(unit = %unit.short(), "Container restarted"),
                Err(e) => tracing::error!(unit = %unit.short(), error = %e, "Error restarting container"),
            }
        }

        true
    }

    /// Terminate a resource regardless of its current status.
    ///
    /// The record stays in the registry with status `terminated`.
    /// Returns `false` only when the name is unknown.
    #[tracing::instrument(skip(self))]
    pub async fn terminate(&mut self, name: &str) -> bool {
        let Some(index) = self.position(name) else {
            tracing::debug!(resource = %name, "Cannot terminate unknown resource");
            return false;
        };

        self.registry[index].set_status(ResourceStatus::Terminated);
        let backend_ref = self.registry[index].backend_ref().cloned();
        self.record(name.to_string(), LifecycleEvent::Terminated, None);
        tracing::info!(resource = %name, "Server terminated");

        if let Some(unit) = backend_ref {
            if let Err(e) = self.backend.halt(&unit).await {
                tracing::debug!(unit = %unit.short(), error = %e, "Ignoring halt failure");
            }
        }

        true
    }

    /// Remove a resource from the registry, force-removing its backend unit.
    ///
    /// Returns `false` only when the name is unknown.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&mut self, name: &str) -> bool {
        let Some(index) = self.position(name) else {
            tracing::debug!(resource = %name, "Cannot delete unknown resource");
            return false;
        };

        let resource = self.registry.remove(index);
        self.record(name.to_string(), LifecycleEvent::Deleted, None);
        tracing::info!(resource = %name, "Server deleted");

        if let Some(unit) = resource.backend_ref() {
            match self.backend.remove(unit).await {
                Ok(()) => tracing::info!(unit = %unit.short(), "Container removed"),
                Err(e) => tracing::error!(unit = %unit.short(), error = %e, "Error removing container"),
            }
        }

        true
    }

    /// Snapshot of all resources in insertion order.
    pub fn list(&self) -> Vec<Resource> {
        self.registry.clone()
    }

    /// Look up one resource by name.
    pub fn get(&self, name: &str) -> Option<Resource> {
        self.position(name).map(|index| self.registry[index].clone())
    }

    /// Recent lifecycle events, newest first, optionally for one resource.
    pub fn events(&self, name: Option<&str>, limit: Option<usize>) -> Vec<ResourceEvent> {
        self.events
            .iter()
            .rev()
            .filter(|event| name.is_none_or(|name| event.name == name))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }

    /// Which backend variant this manager drives.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.registry.iter().position(|resource| resource.name() == name)
    }

    fn position_with_status(&self, name: &str, required: ResourceStatus) -> Option<usize> {
        let Some(index) = self.position(name) else {
            tracing::debug!(resource = %name, "Unknown resource");
            return None;
        };

        let status = self.registry[index].status();
        if status != required {
            tracing::debug!(resource = %name, %status, "Resource is not {}", required);
            return None;
        }

        Some(index)
    }

    fn derive_name(&self, template: &ResourceTemplate) -> String {
        let mut id = Utc::now().timestamp();
        loop {
            let name = template.format_name(&id.to_string());
            if self.position(&name).is_none() {
                return name;
            }
            id += 1;
        }
    }

    fn record(&mut self, name: String, event: LifecycleEvent, details: Option<String>) {
        self.events.push_back(ResourceEvent {
            name,
            event,
            timestamp: Utc::now(),
            details,
        });

        if self.events.len() > MAX_EVENTS {
            self.events.pop_front();
        }
    }
}
