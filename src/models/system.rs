// Agent snapshot: system identity, CPU, memory

use serde::{Deserialize, Serialize};

use super::{DiskMetrics, DockerCounts, NetworkMetrics, ProcessMetrics, TemperatureReading};

/// Host identity and static facts as reported by the agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemInfo {
    pub hostname: String,
    pub os: String,
    pub platform: String,
    pub kernel_version: String,
    pub uptime: u64,
    pub boot_time: u64,
    #[serde(default)]
    pub num_cpu: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadAverage {
    pub load1: f64,
    pub load5: f64,
    pub load15: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuMetrics {
    pub usage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_core: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_avg: Option<LoadAverage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub used_percent: f64,
    pub free: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactive: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buffers: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cached: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared: Option<u64>,
}

/// One agent's point-in-time report. `agent_id`, `timestamp`, `system`,
/// `cpu` and `memory` are mandatory; the optional collections mean
/// "not collected on this platform" when absent.
///
/// Snapshots are immutable once accepted; history keeps them in arrival
/// order regardless of the reported `timestamp`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: String,
    /// Seconds since epoch, captured by the agent.
    pub timestamp: u64,
    pub system: SystemInfo,
    pub cpu: CpuMetrics,
    pub memory: MemoryMetrics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disks: Option<Vec<DiskMetrics>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<NetworkMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperatures: Option<Vec<TemperatureReading>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processes: Option<Vec<ProcessMetrics>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docker: Option<DockerCounts>,
}
