// Service-host stats via sysinfo, for the health endpoint. The agents
// report their own hosts; this covers the machine running the service.

use serde::Serialize;
use std::sync::Arc;
use sysinfo::{Disks, Networks, System};
use tracing::instrument;

/// Aggregate status of the host running this service.
#[derive(Debug, Clone, Serialize)]
pub struct HostStatus {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub memory_total: u64,
    pub memory_used: u64,
    pub disk_total: u64,
    pub disk_used: u64,
    pub disk_percent: f64,
    /// Cumulative since boot, summed over interfaces.
    pub network_sent: u64,
    pub network_recv: u64,
}

pub struct HostRepo {
    sys: Arc<std::sync::Mutex<System>>,
    disks: Arc<std::sync::Mutex<Disks>>,
    networks: Arc<std::sync::Mutex<Networks>>,
}

impl Default for HostRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRepo {
    pub fn new() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        let disks = Disks::new_with_refreshed_list();
        let networks = Networks::new_with_refreshed_list();
        Self {
            sys: Arc::new(std::sync::Mutex::new(sys)),
            disks: Arc::new(std::sync::Mutex::new(disks)),
            networks: Arc::new(std::sync::Mutex::new(networks)),
        }
    }

    pub fn hostname() -> String {
        System::host_name().unwrap_or_else(|| "unknown".into())
    }

    #[instrument(skip(self), fields(repo = "host", operation = "status"))]
    pub async fn status(&self) -> anyhow::Result<HostStatus> {
        let sys = self.sys.clone();
        let disks = self.disks.clone();
        let networks = self.networks.clone();
        tokio::task::spawn_blocking(move || {
            let mut sys = sys
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo lock poisoned: {}", e))?;
            sys.refresh_cpu_all();
            sys.refresh_memory();
            let cpu_percent = (sys.global_cpu_usage() as f64).clamp(0.0, 100.0);
            let memory_total = sys.total_memory();
            let memory_used = memory_total.saturating_sub(sys.available_memory());
            let memory_percent = if memory_total > 0 {
                (memory_used as f64 / memory_total as f64) * 100.0
            } else {
                0.0
            };
            drop(sys);

            let mut disks_guard = disks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo disks lock poisoned: {}", e))?;
            disks_guard.refresh(false);
            let mut disk_total = 0u64;
            let mut disk_used = 0u64;
            for d in disks_guard.list() {
                disk_total += d.total_space();
                disk_used += d.total_space().saturating_sub(d.available_space());
            }
            let disk_percent = if disk_total > 0 {
                (disk_used as f64 / disk_total as f64) * 100.0
            } else {
                0.0
            };
            drop(disks_guard);

            let mut networks_guard = networks
                .lock()
                .map_err(|e| anyhow::anyhow!("sysinfo networks lock poisoned: {}", e))?;
            networks_guard.refresh(true);
            let mut network_sent = 0u64;
            let mut network_recv = 0u64;
            for (_, data) in networks_guard.list() {
                network_sent += data.total_transmitted();
                network_recv += data.total_received();
            }

            Ok(HostStatus {
                cpu_percent,
                memory_percent,
                memory_total,
                memory_used,
                disk_total,
                disk_used,
                disk_percent,
                network_sent,
                network_recv,
            })
        })
        .await
        .map_err(|e| anyhow::anyhow!("sysinfo task join: {}", e))?
    }
}
