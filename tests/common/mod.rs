// Shared test helpers

use infrawatch::models::*;

pub fn sample_snapshot(agent_id: &str, timestamp: u64, cpu_usage: f64) -> AgentSnapshot {
    AgentSnapshot {
        agent_id: agent_id.into(),
        timestamp,
        system: SystemInfo {
            hostname: "test-host".into(),
            os: "linux".into(),
            platform: "debian".into(),
            kernel_version: "6.1.0".into(),
            uptime: 3600,
            boot_time: 1_700_000_000,
            num_cpu: 4,
        },
        cpu: CpuMetrics {
            usage: cpu_usage,
            per_core: None,
            frequency: None,
            load_avg: None,
        },
        memory: MemoryMetrics {
            total: 8 * 1024 * 1024 * 1024,
            available: 4 * 1024 * 1024 * 1024,
            used: 4 * 1024 * 1024 * 1024,
            used_percent: 50.0,
            free: 4 * 1024 * 1024 * 1024,
            active: None,
            inactive: None,
            buffers: None,
            cached: None,
            shared: None,
        },
        disks: None,
        network: None,
        temperatures: None,
        processes: None,
        docker: None,
    }
}
