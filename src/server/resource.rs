// src/server/resource.rs
use crate::config::ResourceTemplate;
use crate::runtime::{ADDRESS_UNAVAILABLE, BackendRef, DiscoveredUnit, Provisioned};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Lifecycle status of a resource
///
/// ```text
/// deploying -> running | failed
/// running   -> stopped | terminated
/// stopped   -> running | terminated
/// ```
///
/// `failed` and `terminated` only leave the registry through deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceStatus {
    /// Being brought up by the backend
    Deploying,
    /// Up and serving
    Running,
    /// Stopped, can be restarted
    Stopped,
    /// Shut down for good, record retained until deleted
    Terminated,
    /// The backend refused to create it
    Failed,
}

impl ResourceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ResourceStatus::Deploying => "deploying",
            ResourceStatus::Running => "running",
            ResourceStatus::Stopped => "stopped",
            ResourceStatus::Terminated => "terminated",
            ResourceStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ResourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tracked deployable unit
///
/// Records are only mutated by the lifecycle manager; callers receive
/// clones. `deployed_at` never changes after creation and `backend_ref`
/// is present exactly when `is_real` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    name: String,
    #[serde(rename = "type")]
    resource_type: String,
    status: ResourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend_ref: Option<BackendRef>,
    network_address: String,
    deployed_at: DateTime<Utc>,
    is_real: bool,
    image: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    attributes: Map<String, Value>,
}

impl Resource {
    /// A fresh record for `template`, not yet provisioned
    pub(crate) fn deploying(name: String, template: &ResourceTemplate, deployed_at: DateTime<Utc>) -> Self {
        Self {
            name,
            resource_type: template.type_name.clone(),
            status: ResourceStatus::Deploying,
            backend_ref: None,
            network_address: ADDRESS_UNAVAILABLE.to_string(),
            deployed_at,
            is_real: false,
            image: template.image.clone(),
            attributes: template.defaults.clone(),
        }
    }

    /// A record seeded from a unit that already exists in the runtime
    pub(crate) fn reconciled(unit: DiscoveredUnit, template: &ResourceTemplate, deployed_at: DateTime<Utc>) -> Self {
        Self {
            name: unit.name,
            resource_type: template.type_name.clone(),
            status: unit.status,
            backend_ref: Some(unit.backend_ref),
            network_address: unit.network_address,
            deployed_at,
            is_real: true,
            image: unit.image,
            attributes: template.defaults.clone(),
        }
    }

    /// Move out of `deploying` according to the provisioning outcome
    pub(crate) fn settle(&mut self, provisioned: Provisioned) {
        match provisioned {
            Provisioned::Real {
                backend_ref,
                network_address,
            } => {
                self.status = ResourceStatus::Running;
                self.backend_ref = Some(backend_ref);
                self.network_address = network_address;
                self.is_real = true;
            }
            Provisioned::Simulated { network_address } => {
                self.status = ResourceStatus::Running;
                self.network_address = network_address;
            }
            Provisioned::Failed { .. } => {
                self.status = ResourceStatus::Failed;
            }
        }
    }

    pub(crate) fn set_status(&mut self, status: ResourceStatus) {
        self.status = status;
    }

    /// Unique name within the registry
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Catalog type name
    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn status(&self) -> ResourceStatus {
        self.status
    }

    /// Handle into the real backend, absent for simulated or failed resources
    pub fn backend_ref(&self) -> Option<&BackendRef> {
        self.backend_ref.as_ref()
    }

    /// Network address, or `"unavailable"`
    pub fn network_address(&self) -> &str {
        &self.network_address
    }

    pub fn deployed_at(&self) -> DateTime<Utc> {
        self.deployed_at
    }

    /// Whether the resource is backed by the external runtime
    pub fn is_real(&self) -> bool {
        self.is_real
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// Default attributes copied from the template
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> ResourceTemplate {
        let mut template = ResourceTemplate::new("web_server", "web_server_{id}", "nginx:alpine");
        template.defaults.insert("cpu".to_string(), Value::from(2));
        template
    }

    #[test]
    fn test_settle_failed_keeps_record_simulated() {
        let mut resource = Resource::deploying("web_server_1".to_string(), &template(), Utc::now());
        resource.settle(Provisioned::Failed {
            reason: "image not found".to_string(),
        });

        assert_eq!(resource.status(), ResourceStatus::Failed);
        assert!(!resource.is_real());
        assert!(resource.backend_ref().is_none());
        assert_eq!(resource.network_address(), ADDRESS_UNAVAILABLE);
    }

    #[test]
    fn test_serialized_shape() {
        let mut resource = Resource::deploying("web_server_1".to_string(), &template(), Utc::now());
        resource.settle(Provisioned::Real {
            backend_ref: BackendRef::new("3f2a9c1e7b44"),
            network_address: "172.17.0.2".to_string(),
        });

        let json = serde_json::to_value(&resource).unwrap();
        assert_eq!(json["type"], "web_server");
        assert_eq!(json["status"], "running");
        assert_eq!(json["backend_ref"], "3f2a9c1e7b44");
        assert_eq!(json["is_real"], true);
        assert_eq!(json["attributes"]["cpu"], 2);
    }
}
