/// Runtime backend module for Fleet Sentinel.
///
/// Resources run on one of two backends, chosen once at startup:
///
/// * `real` - forwards every operation to an external container runtime
///   through the [`ContainerRuntime`] interface
/// * `simulated` - in-memory, time-delayed, with fabricated addresses
///
/// The lifecycle manager only ever talks to [`RuntimeBackend`].
///
/// # Examples
///
/// ```no_run
/// use fleet_sentinel::config::RuntimeConfig;
/// use fleet_sentinel::runtime::{self, DockerCli};
/// use std::sync::Arc;
///
/// # async fn run() {
/// let config = RuntimeConfig::default();
/// let docker = Arc::new(DockerCli::new(&config.binary));
///
/// // Falls back to simulation when `docker ps` fails
/// let backend = runtime::select_backend(docker, &config).await;
/// println!("Using {} backend", backend.kind());
/// # }
/// ```
mod docker;
mod real;
mod simulated;

pub use docker::DockerCli;
pub use real::{RealBackend, classify_status};
pub use simulated::SimulatedBackend;

use crate::config::{ResourceTemplate, RuntimeConfig};
use crate::error::Result;
use crate::server::ResourceStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Network address reported when none can be resolved.
pub const ADDRESS_UNAVAILABLE: &str = "unavailable";

/// One unit as listed by the container runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSummary {
    pub name: String,
    pub id: String,
    /// Free-form status, e.g. `Up 3 hours` or `Exited (0) 2 days ago`
    pub status_text: String,
    pub image: String,
    /// Creation time, when the runtime reports a parseable one
    pub created_at: Option<DateTime<Utc>>,
}

/// Command surface of an external container runtime.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Whether the runtime answers at all.
    async fn probe(&self) -> bool;

    /// Units whose names match any of `name_prefixes`.
    async fn list_units(&self, name_prefixes: &[String]) -> Result<Vec<UnitSummary>>;

    /// Create and start a detached unit, returning its id.
    async fn create_and_start(&self, name: &str, image: &str, command: &[String]) -> Result<String>;

    /// Stop a unit, giving it `grace` before it is killed.
    async fn stop(&self, id: &str, grace: Option<Duration>) -> Result<()>;

    /// Start a stopped unit.
    async fn start(&self, id: &str) -> Result<()>;

    /// Remove a unit, killing it first when `force` is set.
    async fn remove(&self, id: &str, force: bool) -> Result<()>;

    /// Primary network address of a unit, `None` when it has none.
    async fn inspect_address(&self, id: &str) -> Result<Option<String>>;
}

/// Opaque handle to a unit in the external runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct BackendRef(String);

impl BackendRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for BackendRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which backend variant is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Real,
    Simulated,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Real => f.write_str("real"),
            BackendKind::Simulated => f.write_str("simulated"),
        }
    }
}

/// Outcome of provisioning a new resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Provisioned {
    /// Running in the external runtime.
    Real {
        backend_ref: BackendRef,
        network_address: String,
    },
    /// Running in simulation.
    Simulated { network_address: String },
    /// The runtime refused to create the unit.
    Failed { reason: String },
}

/// A pre-existing unit found during startup reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscoveredUnit {
    pub name: String,
    pub backend_ref: BackendRef,
    pub status: ResourceStatus,
    pub network_address: String,
    pub image: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Execution substrate for resources.
///
/// `stop`, `start`, `halt` and `remove` are only invoked for resources
/// that carry a [`BackendRef`]. Their failures are reported, and the
/// caller decides whether to care.
#[async_trait]
pub trait RuntimeBackend: Send + Sync {
    /// Which variant this is.
    fn kind(&self) -> BackendKind;

    /// Existing units whose names start with one of `name_prefixes`.
    async fn discover(&self, name_prefixes: &[String]) -> Result<Vec<DiscoveredUnit>>;

    /// Bring up a new resource. `ordinal` is the registry size before insertion.
    async fn provision(&self, name: &str, template: &ResourceTemplate, ordinal: usize) -> Provisioned;

    /// Stop a unit within the configured stop timeout.
    async fn stop(&self, unit: &BackendRef) -> Result<()>;

    /// Start a stopped unit.
    async fn start(&self, unit: &BackendRef) -> Result<()>;

    /// Stop a unit for termination, without the stop timeout.
    async fn halt(&self, unit: &BackendRef) -> Result<()>;

    /// Force-remove a unit.
    async fn remove(&self, unit: &BackendRef) -> Result<()>;
}

/// Probe `runtime` and pick the backend for the process lifetime.
#[tracing::instrument(skip(runtime, config))]
pub async fn select_backend(
    runtime: Arc<dyn ContainerRuntime>,
    config: &RuntimeConfig,
) -> Box<dyn RuntimeBackend> {
    if runtime.probe().await {
        tracing::info!("Container runtime is available - using real containers");
        Box::new(RealBackend::new(runtime, config))
    } else {
        tracing::warn!("Container runtime not available - using simulation mode");
        Box::new(SimulatedBackend::new(config))
    }
}
