/*!
 # Fleet Sentinel

 A Rust library for deploying, tracking and monitoring a small fleet of
 servers, backed by a container runtime or by an in-process simulation.

 ## Overview

 Fleet Sentinel provides functionality to:
 - Deploy servers from a catalog of templates
 - Stop, restart, terminate and delete them through a strict state machine
 - Adopt containers left running by a previous session
 - Sample host CPU, memory, disk and network metrics and raise threshold alerts
 - Optionally expose all of the above over an HTTP API

 ## Basic Usage

 ```no_run
 use fleet_sentinel::{Result, Sentinel};

 #[tokio::main]
 async fn main() -> Result<()> {
     // Falls back to simulation when no container runtime answers
     let sentinel = Sentinel::from_config_file("config.json").await?;

     // One server of every configured type
     let servers = sentinel.deploy_all().await;
     println!("Deployed {} servers", servers.len());

     // Or a specific one
     let web = sentinel.deploy("web_server", Some("1")).await?;
     sentinel.stop(web.name()).await;

     // Sample host metrics and evaluate thresholds
     let sample = sentinel.sample().await;
     for alert in &sample.alerts {
         println!("{}", alert);
     }

     Ok(())
 }
 ```

 ## Features

 - **Lifecycle management**: deploy, stop, restart, terminate and delete
 - **Two backends**: real containers via the Docker CLI, or simulation
 - **Monitoring**: host metrics through `sysinfo`, threshold alerts
 - **Configuration**: JSON or YAML files, every section optional
 - **HTTP API**: Actix Web routes over the same operations
*/

pub mod api;
pub mod config;
pub mod error;
pub mod monitor;
pub mod runtime;
pub mod server;

pub use config::Config;
pub use error::{Error, Result};
pub use server::{Resource, ResourceStatus};

use monitor::{
    AlertLog, LoggedAlert, MetricsSnapshot, MetricsSource, MonitoringEngine, ProcessInfo, Sample,
    SysinfoSource,
};
use runtime::{BackendKind, DockerCli, RuntimeBackend};
use serde::Serialize;
use server::{ResourceEvent, ResourceLifecycleManager};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Fleet-wide counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Resources in the registry, whatever their status
    pub total_servers: usize,
    /// Resources currently running
    pub active_servers: usize,
    /// Resources backed by the container runtime
    pub real_servers: usize,
    /// Alerts logged since startup (or retained, when the log is bounded)
    pub total_alerts: usize,
    /// Whether the real backend is active
    pub runtime_enabled: bool,
}

/// Deploy, track and monitor a fleet of servers
///
/// This struct is the main entry point. It owns the lifecycle manager,
/// the monitoring engine and the alert log, and serializes access to the
/// registry so it can be shared across tasks behind an `Arc`.
pub struct Sentinel {
    config: Config,
    manager: Mutex<ResourceLifecycleManager>,
    engine: MonitoringEngine,
    alerts: Mutex<AlertLog>,
}

impl Sentinel {
    /// Create a sentinel from a configuration file path
    #[tracing::instrument(skip(path), fields(config_path = ?path.as_ref()))]
    pub async fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        tracing::info!("Loading configuration from file");
        let config = Config::from_file(path)?;
        Self::new(config).await
    }

    /// Create a sentinel from a configuration
    ///
    /// Validates the configuration, probes the container runtime to pick a
    /// backend, adopts existing containers and wires up `sysinfo` metrics.
    #[tracing::instrument(skip(config), fields(num_templates = config.templates.len()))]
    pub async fn new(config: Config) -> Result<Self> {
        crate::config::validate_config(&config)?;

        let docker = Arc::new(DockerCli::new(&config.runtime.binary));
        let backend = runtime::select_backend(docker, &config.runtime).await;
        let source: Arc<dyn MetricsSource> = Arc::new(SysinfoSource::new());

        Ok(Self::with_parts(config, backend, source).await)
    }

    /// Create a sentinel over explicit collaborators
    ///
    /// The configuration is used as given; reconciliation still runs when
    /// `backend` is a real one.
    pub async fn with_parts(
        config: Config,
        backend: Box<dyn RuntimeBackend>,
        source: Arc<dyn MetricsSource>,
    ) -> Self {
        let manager = ResourceLifecycleManager::new(config.templates.clone(), backend).await;
        let engine = MonitoringEngine::new(source, config.monitoring.clone());
        let alerts = AlertLog::with_capacity(config.monitoring.alert_log_capacity);

        tracing::info!(
            backend = %manager.backend_kind(),
            num_resources = manager.len(),
            "Sentinel ready"
        );

        Self {
            config,
            manager: Mutex::new(manager),
            engine,
            alerts: Mutex::new(alerts),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Deploy one resource of `type_name`, see [`ResourceLifecycleManager::deploy`]
    pub async fn deploy(&self, type_name: &str, id: Option<&str>) -> Result<Resource> {
        self.manager.lock().await.deploy(type_name, id).await
    }

    /// Deploy one resource of every configured type
    pub async fn deploy_all(&self) -> Vec<Resource> {
        self.manager.lock().await.deploy_all().await
    }

    pub async fn list(&self) -> Vec<Resource> {
        self.manager.lock().await.list()
    }

    pub async fn get(&self, name: &str) -> Option<Resource> {
        self.manager.lock().await.get(name)
    }

    pub async fn stop(&self, name: &str) -> bool {
        self.manager.lock().await.stop(name).await
    }

    pub async fn restart(&self, name: &str) -> bool {
        self.manager.lock().await.restart(name).await
    }

    pub async fn terminate(&self, name: &str) -> bool {
        self.manager.lock().await.terminate(name).await
    }

    pub async fn delete(&self, name: &str) -> bool {
        self.manager.lock().await.delete(name).await
    }

    /// Recent lifecycle events, newest first
    pub async fn events(&self, name: Option<&str>, limit: Option<usize>) -> Vec<ResourceEvent> {
        self.manager.lock().await.events(name, limit)
    }

    /// Which backend is active
    pub async fn backend_kind(&self) -> BackendKind {
        self.manager.lock().await.backend_kind()
    }

    /// Sample host metrics, evaluate thresholds and log alerts
    ///
    /// The alert log stays readable while the CPU interval elapses.
    pub async fn sample(&self) -> Sample {
        let sample = self.engine.observe().await;
        self.engine.record(&sample, &mut *self.alerts.lock().await);
        sample
    }

    /// Sample host metrics without evaluating thresholds
    pub async fn current_metrics(&self) -> MetricsSnapshot {
        self.engine.current_metrics().await
    }

    /// Up to `limit` processes, busiest CPU first
    pub async fn top_processes(&self, limit: usize) -> Vec<ProcessInfo> {
        self.engine.top_processes(limit).await
    }

    /// Up to `limit` logged alerts, newest first
    pub async fn recent_alerts(&self, limit: usize) -> Vec<LoggedAlert> {
        self.alerts.lock().await.recent(limit)
    }

    /// Fleet-wide counters
    #[tracing::instrument(skip(self))]
    pub async fn stats(&self) -> Stats {
        let (resources, backend) = {
            let manager = self.manager.lock().await;
            (manager.list(), manager.backend_kind())
        };
        let total_alerts = self.alerts.lock().await.len();

        Stats {
            total_servers: resources.len(),
            active_servers: resources
                .iter()
                .filter(|r| r.status() == ResourceStatus::Running)
                .count(),
            real_servers: resources.iter().filter(|r| r.is_real()).count(),
            total_alerts,
            runtime_enabled: backend == BackendKind::Real,
        }
    }
}
