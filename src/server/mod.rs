/// Resource management module for Fleet Sentinel.
///
/// This module holds the resource registry and the lifecycle state
/// machine. Every lifecycle operation is instrumented with `tracing`
/// spans, and every state change is appended to a bounded event journal.
///
/// # Components
///
/// * `resource` - The resource record and its status
/// * `lifecycle` - Deploy, stop, restart, terminate and delete, plus
///   startup reconciliation against a real backend
///
/// # Examples
///
/// ```no_run
/// use fleet_sentinel::config::{RuntimeConfig, TemplateCatalog};
/// use fleet_sentinel::runtime::SimulatedBackend;
/// use fleet_sentinel::server::{ResourceLifecycleManager, ResourceStatus};
///
/// # async fn run() -> fleet_sentinel::Result<()> {
/// let backend = Box::new(SimulatedBackend::new(&RuntimeConfig::default()));
/// let mut manager = ResourceLifecycleManager::new(TemplateCatalog::default(), backend).await;
///
/// let server = manager.deploy("web_server", Some("1")).await?;
/// assert_eq!(server.status(), ResourceStatus::Running);
///
/// assert!(manager.stop("web_server_1").await);
/// assert!(manager.restart("web_server_1").await);
/// # Ok(())
/// # }
/// ```
pub mod lifecycle;
mod resource;

pub use lifecycle::{LifecycleEvent, ResourceEvent, ResourceLifecycleManager};
pub use resource::{Resource, ResourceStatus};
