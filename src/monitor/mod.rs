/// Monitoring and alerting module for Fleet Sentinel.
///
/// This module samples host-level metrics (CPU, memory, disk, network,
/// process count), evaluates them against configured thresholds and
/// produces alerts.
///
/// # Components
///
/// * `source` - Metrics source interface and its `sysinfo` implementation
/// * `metrics` - Snapshot and process descriptor types
/// * `alerts` - Threshold evaluation and the caller-owned alert log
/// * `engine` - The monitoring engine tying them together
///
/// # Examples
///
/// ```no_run
/// use fleet_sentinel::config::MonitoringConfig;
/// use fleet_sentinel::monitor::{AlertLog, MonitoringEngine, SysinfoSource};
/// use std::sync::Arc;
///
/// # async fn run() {
/// let engine = MonitoringEngine::new(Arc::new(SysinfoSource::new()), MonitoringConfig::default());
/// let mut log = AlertLog::new();
///
/// let sample = engine.sample(&mut log).await;
/// println!("CPU {:.1}%, {} alerts", sample.snapshot.cpu_usage, sample.alerts.len());
/// # }
/// ```
pub mod alerts;
pub mod engine;
mod metrics;
pub mod source;

pub use alerts::{Alert, AlertLog, LoggedAlert};
pub use engine::{MonitoringEngine, Sample};
pub use metrics::{Metric, MetricsSnapshot, NetworkIo, ProcessInfo};
pub use source::{MetricsSource, SysinfoSource};
