// Domain models (wire format shared with the reporting agents)

mod docker;
mod network;
mod process;
mod storage;
mod system;

pub use docker::{
    ContainerActionResult, ContainerInfo, ContainerState, ContainerStats, DockerCounts,
    DockerStatus, EngineInfo, ImageInfo, NetworkInfo, VolumeInfo,
};
pub use network::{InterfaceMetrics, NetworkMetrics};
pub use process::{ProcessMetrics, TemperatureReading};
pub use storage::{DiskMetrics, IoStats};
pub use system::{AgentSnapshot, CpuMetrics, LoadAverage, MemoryMetrics, SystemInfo};
