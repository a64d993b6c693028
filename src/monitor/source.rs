//! Host metrics sources.

use crate::error::{Error, Result};
use crate::monitor::{NetworkIo, ProcessInfo};
use async_trait::async_trait;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use sysinfo::{Disks, Networks, System};

/// Shortest window over which sysinfo can compute a CPU percentage.
const MIN_CPU_WINDOW: Duration = Duration::from_millis(200);

/// Read-only view of host-level metrics.
///
/// Every method reads the host at the moment of the call. CPU readings
/// need an observation window, so `cpu_percent` and `list_processes`
/// block for that window.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Host CPU utilization over `interval`, 0..=100.
    async fn cpu_percent(&self, interval: Duration) -> Result<f64>;

    /// Host memory utilization, 0..=100.
    fn memory_percent(&self) -> Result<f64>;

    /// Utilization of the filesystem holding `path`, 0..=100.
    fn disk_percent(&self, path: &Path) -> Result<f64>;

    /// Cumulative bytes sent and received across all interfaces.
    fn net_io_counters(&self) -> Result<NetworkIo>;

    /// Number of live processes.
    fn pid_count(&self) -> Result<usize>;

    /// Every process still alive and readable at inspection time.
    async fn list_processes(&self) -> Result<Vec<ProcessInfo>>;
}

/// [`MetricsSource`] backed by the `sysinfo` crate.
pub struct SysinfoSource {
    system: Mutex<System>,
}

impl SysinfoSource {
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new()),
        }
    }

    fn system(&self) -> Result<MutexGuard<'_, System>> {
        self.system
            .lock()
            .map_err(|_| Error::Other("Failed to lock system info".to_string()))
    }
}

impl Default for SysinfoSource {
    fn default() -> Self {
        Self::new()
    }
}

fn percent(used: u64, total: u64, what: &str) -> Result<f64> {
    if total == 0 {
        return Err(Error::Metrics(format!("{} total reported as zero", what)));
    }
    Ok(used as f64 / total as f64 * 100.0)
}

#[async_trait]
impl MetricsSource for SysinfoSource {
    async fn cpu_percent(&self, interval: Duration) -> Result<f64> {
        self.system()?.refresh_cpu_usage();

        tokio::time::sleep(interval.max(MIN_CPU_WINDOW)).await;

        let usage = {
            let mut system = self.system()?;
            system.refresh_cpu_usage();
            system.global_cpu_info().cpu_usage()
        };
        Ok(f64::from(usage).clamp(0.0, 100.0))
    }

    fn memory_percent(&self) -> Result<f64> {
        let mut system = self.system()?;
        system.refresh_memory();
        percent(system.used_memory(), system.total_memory(), "Memory")
    }

    fn disk_percent(&self, path: &Path) -> Result<f64> {
        let disks = Disks::new_with_refreshed_list();

        // Longest mount point containing the path
        let disk = disks
            .list()
            .iter()
            .filter(|disk| path.starts_with(disk.mount_point()))
            .max_by_key(|disk| disk.mount_point().as_os_str().len())
            .ok_or_else(|| {
                Error::Metrics(format!("No mounted filesystem holds {}", path.display()))
            })?;

        let total = disk.total_space();
        let used = total.saturating_sub(disk.available_space());
        percent(used, total, "Disk")
    }

    fn net_io_counters(&self) -> Result<NetworkIo> {
        let networks = Networks::new_with_refreshed_list();

        Ok(networks
            .iter()
            .fold(NetworkIo::default(), |acc, (_name, data)| NetworkIo {
                bytes_sent: acc.bytes_sent + data.total_transmitted(),
                bytes_recv: acc.bytes_recv + data.total_received(),
            }))
    }

    fn pid_count(&self) -> Result<usize> {
        let mut system = self.system()?;
        system.refresh_processes();
        Ok(system.processes().len())
    }

    async fn list_processes(&self) -> Result<Vec<ProcessInfo>> {
        self.system()?.refresh_processes();

        // Per-process CPU needs two refreshes
        tokio::time::sleep(MIN_CPU_WINDOW).await;

        let mut system = self.system()?;
        system.refresh_memory();
        system.refresh_processes();
        let total_memory = system.total_memory();

        Ok(system
            .processes()
            .values()
            .map(|process| ProcessInfo {
                pid: process.pid().as_u32(),
                name: process.name().to_string(),
                cpu_percent: f64::from(process.cpu_usage()),
                memory_percent: percent(process.memory(), total_memory, "Memory").unwrap_or(0.0),
            })
            .collect())
    }
}
