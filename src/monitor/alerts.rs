//! Threshold evaluation and the alert log.

use crate::config::ThresholdConfig;
use crate::monitor::{Metric, MetricsSnapshot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// A threshold breach, rendered to its message when raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub metric: Metric,
    pub observed: f64,
    pub threshold: f64,
    pub message: String,
}

impl Alert {
    pub fn new(metric: Metric, observed: f64, threshold: f64) -> Self {
        Self {
            metric,
            observed,
            threshold,
            message: format!("High {} usage: {:.1}%", metric.label(), observed),
        }
    }
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Compare every thresholded metric of `snapshot` against its ceiling.
///
/// Only strictly greater values alert; a reading equal to its ceiling
/// does not.
pub fn evaluate(thresholds: &ThresholdConfig, snapshot: &MetricsSnapshot) -> Vec<Alert> {
    thresholds
        .iter()
        .filter_map(|(metric, ceiling)| {
            let observed = metric.observe(snapshot);
            (observed > ceiling).then(|| Alert::new(metric, observed, ceiling))
        })
        .collect()
}

/// An alert together with the time it was logged.
#[derive(Debug, Clone, Serialize)]
pub struct LoggedAlert {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub alert: Alert,
}

/// Caller-owned record of raised alerts.
///
/// Unbounded unless built with [`AlertLog::bounded`], in which case the
/// oldest entries are dropped first.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    entries: VecDeque<LoggedAlert>,
    capacity: Option<usize>,
}

impl AlertLog {
    /// Create an unbounded alert log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log that retains at most `capacity` alerts.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    /// Create a log from an optional capacity.
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        capacity.map_or_else(Self::new, Self::bounded)
    }

    /// Append alerts, all stamped with `timestamp`.
    pub fn extend(&mut self, timestamp: DateTime<Utc>, alerts: &[Alert]) {
        for alert in alerts {
            self.entries.push_back(LoggedAlert {
                timestamp,
                alert: alert.clone(),
            });
        }

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.entries.pop_front();
            }
        }
    }

    /// Most recent alerts, newest first.
    pub fn recent(&self, limit: usize) -> Vec<LoggedAlert> {
        self.entries.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::NetworkIo;

    fn snapshot(cpu: f64, memory: f64, disk: f64) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            cpu_usage: cpu,
            memory_usage: memory,
            disk_usage: disk,
            network_io: NetworkIo::default(),
            process_count: 1,
        }
    }

    #[test]
    fn test_equality_does_not_alert() {
        let alerts = evaluate(&ThresholdConfig::default(), &snapshot(81.2, 50.0, 90.0));

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].metric, Metric::Cpu);
        assert_eq!(alerts[0].message, "High CPU usage: 81.2%");
    }

    #[test]
    fn test_every_breach_alerts_in_metric_order() {
        let alerts = evaluate(&ThresholdConfig::default(), &snapshot(99.0, 85.06, 90.01));

        let metrics: Vec<_> = alerts.iter().map(|a| a.metric).collect();
        assert_eq!(metrics, vec![Metric::Cpu, Metric::Memory, Metric::Disk]);
        assert_eq!(alerts[1].to_string(), "High memory usage: 85.1%");
        assert_eq!(alerts[2].to_string(), "High disk usage: 90.0%");
    }

    #[test]
    fn test_unconfigured_metric_never_alerts() {
        let thresholds = ThresholdConfig::new([(Metric::Disk, 10.0)]);
        let alerts = evaluate(&thresholds, &snapshot(100.0, 100.0, 5.0));

        assert!(alerts.is_empty());
    }

    #[test]
    fn test_bounded_log_drops_oldest() {
        let mut log = AlertLog::bounded(2);
        let now = Utc::now();
        log.extend(now, &[Alert::new(Metric::Cpu, 91.0, 80.0)]);
        log.extend(now, &[Alert::new(Metric::Memory, 92.0, 85.0), Alert::new(Metric::Disk, 93.0, 90.0)]);

        assert_eq!(log.len(), 2);
        let recent = log.recent(10);
        assert_eq!(recent[0].alert.metric, Metric::Disk);
        assert_eq!(recent[1].alert.metric, Metric::Memory);
    }

    #[test]
    fn test_unbounded_log_keeps_everything() {
        let mut log = AlertLog::new();
        for i in 0..50 {
            log.extend(Utc::now(), &[Alert::new(Metric::Cpu, 81.0 + i as f64 / 10.0, 80.0)]);
        }

        assert_eq!(log.len(), 50);
        assert_eq!(log.recent(3).len(), 3);
    }
}
