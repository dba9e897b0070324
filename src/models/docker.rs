// Docker models: agent-side counts, engine listings, lifecycle results

use serde::{Deserialize, Serialize};

/// Container/image counts an agent includes in its snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerCounts {
    pub containers_running: u32,
    pub containers_stopped: u32,
    pub containers_paused: u32,
    pub containers_total: u32,
    pub images: u32,
}

/// Docker container state; serializes to lowercase JSON (e.g. "running").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerState {
    Created,
    Running,
    Exited,
    Paused,
    Restarting,
    Dead,
    #[serde(other)]
    Unknown,
}

impl ContainerState {
    /// Parse from Docker API state string (e.g. "running", "exited").
    pub fn from_docker(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "created" => ContainerState::Created,
            "running" => ContainerState::Running,
            "exited" => ContainerState::Exited,
            "paused" => ContainerState::Paused,
            "restarting" => ContainerState::Restarting,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown,
        }
    }
}

/// Engine identity and counts from `docker info`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInfo {
    pub server_version: String,
    pub api_version: String,
    pub os_type: String,
    pub operating_system: String,
    pub arch: String,
    pub kernel_version: String,
    pub containers: u32,
    pub containers_running: u32,
    pub containers_paused: u32,
    pub containers_stopped: u32,
    pub images: u32,
    pub storage_driver: String,
    pub mem_total: u64,
    pub n_cpu: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerInfo {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub image_id: String,
    pub command: String,
    pub created: i64,
    pub state: ContainerState,
    pub status: String,
}

/// Live per-container resource usage, derived from the engine stats stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerStats {
    pub id: String,
    pub name: String,
    pub cpu_percent: f64,
    pub memory_usage: u64,
    pub memory_limit: u64,
    pub memory_percent: f64,
    pub network_rx: u64,
    pub network_tx: u64,
    pub block_read: u64,
    pub block_write: u64,
    pub pids: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageInfo {
    pub id: String,
    pub repo_tags: Vec<String>,
    pub created: i64,
    pub size: i64,
    pub containers: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub id: String,
    pub name: String,
    pub driver: String,
    pub scope: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeInfo {
    pub name: String,
    pub driver: String,
    pub mountpoint: String,
    pub scope: String,
}

/// Full payload for GET /api/v1/docker/metrics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockerStatus {
    pub engine: EngineInfo,
    pub containers: Vec<ContainerInfo>,
    pub container_stats: Vec<ContainerStats>,
    pub images: Vec<ImageInfo>,
    pub networks: Vec<NetworkInfo>,
    pub volumes: Vec<VolumeInfo>,
}

/// Synchronous confirmation for a lifecycle action. Failures are reported
/// as structured error responses instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerActionResult {
    pub status: String,
    pub action: String,
    pub id: String,
    pub message: String,
}

impl ContainerActionResult {
    pub fn success(action: &str, id: &str, message: impl Into<String>) -> Self {
        Self {
            status: "success".into(),
            action: action.into(),
            id: id.into(),
            message: message.into(),
        }
    }
}
