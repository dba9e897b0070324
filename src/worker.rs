// Background janitor: periodic app-stats logging and shutdown plumbing.
// The store has no TTL to enforce; staleness is surfaced by the roster,
// so the janitor only observes.

use crate::store::MetricsStore;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::time::{Duration, interval};

/// Store handle, counters and shutdown for the janitor.
pub struct JanitorDeps {
    pub store: Arc<MetricsStore>,
    pub ws_metrics_connections: Arc<AtomicUsize>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

pub struct JanitorConfig {
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: JanitorDeps, config: JanitorConfig) -> tokio::task::JoinHandle<()> {
    let JanitorDeps {
        store,
        ws_metrics_connections,
        mut shutdown_rx,
    } = deps;

    let stats_log_interval = Duration::from_secs(config.stats_log_interval_secs);

    tokio::spawn(async move {
        let mut stats_log_tick = interval(stats_log_interval);
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // First tick fires immediately; skip it so the first log is a full interval in.
        stats_log_tick.tick().await;

        loop {
            tokio::select! {
                _ = stats_log_tick.tick() => {
                    let agents = store.agent_count().await;
                    let ingest_total = store.ingest_total().await;
                    tracing::info!(
                        agents,
                        ingest_total,
                        ws_metrics_clients =
                            ws_metrics_connections.load(std::sync::atomic::Ordering::Relaxed),
                        "app stats"
                    );
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Janitor shutting down");
                    break;
                }
            }
        }
    })
}
