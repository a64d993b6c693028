use crate::config::MonitoringConfig;
use crate::error::Result;
use crate::monitor::alerts::{self, Alert, AlertLog};
use crate::monitor::{MetricsSnapshot, MetricsSource, ProcessInfo};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Result of one monitoring pass.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    /// The reading the alerts were evaluated against
    #[serde(rename = "metrics")]
    pub snapshot: MetricsSnapshot,
    /// Alerts raised by this reading, in metric order
    pub alerts: Vec<Alert>,
}

impl Sample {
    /// Rendered alert strings.
    pub fn alert_messages(&self) -> Vec<String> {
        self.alerts.iter().map(|alert| alert.message.clone()).collect()
    }
}

/// Samples host metrics and evaluates them against configured thresholds.
///
/// The engine keeps no state between calls beyond its configuration.
/// Raised alerts go into the [`AlertLog`] the caller passes to
/// [`sample`](Self::sample).
pub struct MonitoringEngine {
    source: Arc<dyn MetricsSource>,
    config: MonitoringConfig,
}

impl MonitoringEngine {
    /// Create a new engine over a metrics source
    pub fn new(source: Arc<dyn MetricsSource>, config: MonitoringConfig) -> Self {
        Self { source, config }
    }

    /// Get the monitoring configuration
    pub fn config(&self) -> &MonitoringConfig {
        &self.config
    }

    /// Read a snapshot, evaluate thresholds and log any alerts.
    ///
    /// May block for the configured CPU interval. Never fails: an
    /// unavailable source yields the synthetic snapshot.
    #[tracing::instrument(skip(self, log))]
    pub async fn sample(&self, log: &mut AlertLog) -> Sample {
        let sample = self.observe().await;
        self.record(&sample, log);
        sample
    }

    /// Read a snapshot and evaluate thresholds without touching any log.
    ///
    /// The slow half of [`sample`](Self::sample); pair it with
    /// [`record`](Self::record) to keep a shared log unlocked while the
    /// CPU interval elapses.
    pub async fn observe(&self) -> Sample {
        let snapshot = self.current_metrics().await;
        let alerts = self.evaluate(&snapshot);

        tracing::debug!(
            cpu = snapshot.cpu_usage,
            memory = snapshot.memory_usage,
            disk = snapshot.disk_usage,
            num_alerts = alerts.len(),
            "Sampled host metrics"
        );

        Sample { snapshot, alerts }
    }

    /// Emit and log the alerts of `sample`.
    pub fn record(&self, sample: &Sample, log: &mut AlertLog) {
        if sample.alerts.is_empty() {
            return;
        }
        for alert in &sample.alerts {
            tracing::warn!(metric = %alert.metric, "ALERT: {}", alert);
        }
        log.extend(sample.snapshot.timestamp, &sample.alerts);
    }

    /// Read a snapshot without evaluating thresholds.
    pub async fn current_metrics(&self) -> MetricsSnapshot {
        match self.read_snapshot().await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "Metrics source unavailable, using synthetic snapshot");
                MetricsSnapshot::synthetic()
            }
        }
    }

    /// Alerts `snapshot` would raise under the configured thresholds.
    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> Vec<Alert> {
        alerts::evaluate(&self.config.thresholds, snapshot)
    }

    /// Up to `limit` processes, busiest CPU first.
    ///
    /// Processes that vanish or cannot be read are skipped by the source;
    /// a failing source yields an empty list.
    #[tracing::instrument(skip(self))]
    pub async fn top_processes(&self, limit: usize) -> Vec<ProcessInfo> {
        let mut processes = match self.source.list_processes().await {
            Ok(processes) => processes,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list processes");
                return Vec::new();
            }
        };

        // Unreadable CPU figures count as idle
        let load = |process: &ProcessInfo| {
            if process.cpu_percent.is_nan() {
                0.0
            } else {
                process.cpu_percent
            }
        };
        processes.sort_by(|a, b| load(b).total_cmp(&load(a)));
        processes.truncate(limit);
        processes
    }

    async fn read_snapshot(&self) -> Result<MetricsSnapshot> {
        let timestamp = Utc::now();
        let cpu_usage = self.source.cpu_percent(self.config.cpu_interval()).await?;
        let memory_usage = self.source.memory_percent()?;
        let disk_usage = self.source.disk_percent(&self.config.disk_path)?;
        let network_io = self.source.net_io_counters()?;
        let process_count = self.source.pid_count()?;

        Ok(MetricsSnapshot {
            timestamp,
            cpu_usage,
            memory_usage,
            disk_usage,
            network_io,
            process_count,
        })
    }
}
