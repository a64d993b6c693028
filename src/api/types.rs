//! Request and response bodies for the HTTP API.

use crate::Resource;
use crate::monitor::{LoggedAlert, MetricsSnapshot, ProcessInfo};
use crate::server::ResourceEvent;
use serde::{Deserialize, Serialize};

/// Resource type deployed when the request names none.
pub const DEFAULT_RESOURCE_TYPE: &str = "web_server";

/// Default `limit` for the alert and process listings.
pub const DEFAULT_LIMIT: usize = 20;

/// Body of `POST /api/servers/deploy`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployRequest {
    /// Catalog type name
    #[serde(rename = "type", default = "default_resource_type")]
    pub resource_type: String,
    /// Explicit id; a time-based one is derived when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

fn default_resource_type() -> String {
    DEFAULT_RESOURCE_TYPE.to_string()
}

impl Default for DeployRequest {
    fn default() -> Self {
        Self {
            resource_type: default_resource_type(),
            id: None,
        }
    }
}

/// `?limit=` query parameter
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    pub fn or_default(self) -> usize {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }
}

#[derive(Debug, Serialize)]
pub struct ServerList {
    pub servers: Vec<Resource>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct DeployResponse {
    /// `false` when the backend refused the deploy
    pub success: bool,
    pub server: Resource,
}

/// Outcome of stop, restart, terminate and delete
#[derive(Debug, Serialize)]
pub struct OperationResponse {
    pub success: bool,
}

#[derive(Debug, Serialize)]
pub struct EventList {
    pub events: Vec<ResourceEvent>,
}

/// A fresh reading and the alert strings it raised
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub metrics: MetricsSnapshot,
    pub alerts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct AlertList {
    pub alerts: Vec<LoggedAlert>,
}

#[derive(Debug, Serialize)]
pub struct ProcessList {
    pub processes: Vec<ProcessInfo>,
}
