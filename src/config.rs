use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub publishing: PublishingConfig,
    pub docker: DockerConfig,
    pub monitoring: MonitoringConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Max snapshots kept per agent; oldest are evicted on overflow.
    pub history_limit: usize,
    /// Seconds without an ingest before the roster marks an agent inactive.
    #[serde(default = "default_active_threshold_secs")]
    pub active_threshold_secs: u64,
    /// Default entry count for history queries that omit ?limit=.
    #[serde(default = "default_history_query_limit")]
    pub default_query_limit: usize,
}

fn default_active_threshold_secs() -> u64 {
    60
}

fn default_history_query_limit() -> usize {
    100
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishingConfig {
    /// Max number of metrics updates kept in the broadcast channel for /ws/metrics (slow clients may lag).
    pub broadcast_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DockerConfig {
    /// Grace period passed to the engine for stop/restart.
    pub stop_timeout_secs: u32,
    /// Hard cap for a single Trivy image scan.
    pub scan_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// How often to log app stats (agents, ingests, ws_metrics clients) at INFO level.
    pub stats_log_interval_secs: u64,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.store.history_limit > 0,
            "store.history_limit must be > 0, got {}",
            self.store.history_limit
        );
        anyhow::ensure!(
            self.store.active_threshold_secs > 0,
            "store.active_threshold_secs must be > 0, got {}",
            self.store.active_threshold_secs
        );
        anyhow::ensure!(
            self.store.default_query_limit > 0,
            "store.default_query_limit must be > 0, got {}",
            self.store.default_query_limit
        );
        anyhow::ensure!(
            self.publishing.broadcast_capacity > 0,
            "publishing.broadcast_capacity must be > 0, got {}",
            self.publishing.broadcast_capacity
        );
        anyhow::ensure!(
            self.docker.stop_timeout_secs > 0,
            "docker.stop_timeout_secs must be > 0, got {}",
            self.docker.stop_timeout_secs
        );
        anyhow::ensure!(
            self.docker.scan_timeout_secs > 0,
            "docker.scan_timeout_secs must be > 0, got {}",
            self.docker.scan_timeout_secs
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        Ok(())
    }
}
