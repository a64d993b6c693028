use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A thresholdable host metric.
///
/// Network counters and process count are reported in every snapshot
/// but have no variant here: they are never thresholded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Host CPU utilization
    #[serde(rename = "cpu_usage")]
    Cpu,
    /// Host memory utilization
    #[serde(rename = "memory_usage")]
    Memory,
    /// Utilization of the monitored filesystem
    #[serde(rename = "disk_usage")]
    Disk,
}

impl Metric {
    /// Configuration and serialization key.
    pub fn key(self) -> &'static str {
        match self {
            Metric::Cpu => "cpu_usage",
            Metric::Memory => "memory_usage",
            Metric::Disk => "disk_usage",
        }
    }

    /// Label used in alert messages.
    pub fn label(self) -> &'static str {
        match self {
            Metric::Cpu => "CPU",
            Metric::Memory => "memory",
            Metric::Disk => "disk",
        }
    }

    /// Value of this metric in `snapshot`.
    pub fn observe(self, snapshot: &MetricsSnapshot) -> f64 {
        match self {
            Metric::Cpu => snapshot.cpu_usage,
            Metric::Memory => snapshot.memory_usage,
            Metric::Disk => snapshot.disk_usage,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu_usage" | "cpu" => Ok(Metric::Cpu),
            "memory_usage" | "memory" => Ok(Metric::Memory),
            "disk_usage" | "disk" => Ok(Metric::Disk),
            other => Err(Error::ConfigParse(format!("Unknown threshold metric: {}", other))),
        }
    }
}

/// Cumulative network byte counters across all interfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkIo {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

/// One point-in-time reading of host metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    /// Percent, 0..=100
    pub cpu_usage: f64,
    /// Percent, 0..=100
    pub memory_usage: f64,
    /// Percent, 0..=100
    pub disk_usage: f64,
    pub network_io: NetworkIo,
    pub process_count: usize,
}

impl MetricsSnapshot {
    /// Fixed reading used when the metrics source is unavailable.
    pub fn synthetic() -> Self {
        Self {
            timestamp: Utc::now(),
            cpu_usage: 45.0,
            memory_usage: 60.0,
            disk_usage: 55.0,
            network_io: NetworkIo {
                bytes_sent: 5000,
                bytes_recv: 5000,
            },
            process_count: 150,
        }
    }
}

/// Descriptor of one host process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_percent: f64,
}
