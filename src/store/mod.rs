// In-memory metrics store: latest snapshot per agent + bounded ring-buffer
// history per agent. Constructed at startup and shared via Arc; all
// mutation funnels through ingest/register, everything else reads.

use crate::models::AgentSnapshot;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::instrument;

/// Broadcast payload for the real-time fan-out: one accepted snapshot.
#[derive(Debug, Clone)]
pub struct MetricsUpdate {
    pub agent_id: String,
    pub snapshot: Arc<AgentSnapshot>,
}

/// One agent's slot. The inner mutex serializes same-agent ingests in
/// arrival order; ingests for different agents touch different cells and
/// never contend.
struct AgentCell {
    record: Mutex<AgentRecord>,
}

struct AgentRecord {
    latest: Option<Arc<AgentSnapshot>>,
    history: VecDeque<Arc<AgentSnapshot>>,
    /// Unix seconds of the last ingest or registration.
    last_seen: u64,
    ingest_count: u64,
    metadata: Option<serde_json::Value>,
}

impl AgentRecord {
    fn empty(now: u64) -> Self {
        Self {
            latest: None,
            history: VecDeque::new(),
            last_seen: now,
            ingest_count: 0,
            metadata: None,
        }
    }
}

/// Roster entry for /api/v1/agents and the health response.
#[derive(Debug, Clone, Serialize)]
pub struct AgentRosterEntry {
    pub id: String,
    pub status: &'static str,
    pub last_seen: u64,
    pub samples: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

/// Per-agent one-line summary for the health response.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    pub cpu: f64,
    pub memory: f64,
    pub disks: usize,
    pub timestamp: u64,
}

pub struct MetricsStore {
    agents: RwLock<HashMap<String, Arc<AgentCell>>>,
    history_limit: usize,
}

impl MetricsStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            agents: RwLock::new(HashMap::new()),
            history_limit,
        }
    }

    fn now_unix() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    async fn cell(&self, agent_id: &str) -> Arc<AgentCell> {
        {
            let agents = self.agents.read().await;
            if let Some(cell) = agents.get(agent_id) {
                return cell.clone();
            }
        }
        let mut agents = self.agents.write().await;
        agents
            .entry(agent_id.to_string())
            .or_insert_with(|| {
                Arc::new(AgentCell {
                    record: Mutex::new(AgentRecord::empty(Self::now_unix())),
                })
            })
            .clone()
    }

    /// Accept one snapshot: replace the latest entry wholesale and append
    /// to history, evicting the oldest entry at capacity. Returns the
    /// stored snapshot for fan-out.
    #[instrument(skip(self, snapshot), fields(repo = "store", operation = "ingest", agent_id = %snapshot.agent_id))]
    pub async fn ingest(&self, snapshot: AgentSnapshot) -> Arc<AgentSnapshot> {
        let cell = self.cell(&snapshot.agent_id).await;
        let snapshot = Arc::new(snapshot);
        let mut record = cell.record.lock().await;
        record.latest = Some(snapshot.clone());
        if record.history.len() >= self.history_limit {
            record.history.pop_front();
        }
        record.history.push_back(snapshot.clone());
        record.last_seen = Self::now_unix();
        record.ingest_count += 1;
        snapshot
    }

    /// Attach registration metadata to an agent (creating its slot if it
    /// has not reported yet).
    pub async fn register(&self, agent_id: &str, metadata: serde_json::Value) {
        let cell = self.cell(agent_id).await;
        let mut record = cell.record.lock().await;
        record.metadata = Some(metadata);
        record.last_seen = Self::now_unix();
    }

    /// Most recent snapshot per agent. Agents that registered but never
    /// reported are omitted.
    pub async fn latest(&self) -> BTreeMap<String, Arc<AgentSnapshot>> {
        let agents = self.agents.read().await;
        let mut out = BTreeMap::new();
        for (id, cell) in agents.iter() {
            let record = cell.record.lock().await;
            if let Some(latest) = &record.latest {
                out.insert(id.clone(), latest.clone());
            }
        }
        out
    }

    pub async fn latest_for(&self, agent_id: &str) -> Option<Arc<AgentSnapshot>> {
        let agents = self.agents.read().await;
        let cell = agents.get(agent_id)?.clone();
        drop(agents);
        let record = cell.record.lock().await;
        record.latest.clone()
    }

    /// Up to `limit` most recent entries, oldest first, truncated from the
    /// tail. Unknown agents get an empty vec, never an error.
    #[instrument(skip(self), fields(repo = "store", operation = "history"))]
    pub async fn history(&self, agent_id: &str, limit: usize) -> Vec<Arc<AgentSnapshot>> {
        let agents = self.agents.read().await;
        let Some(cell) = agents.get(agent_id).cloned() else {
            return Vec::new();
        };
        drop(agents);
        let record = cell.record.lock().await;
        let skip = record.history.len().saturating_sub(limit);
        record.history.iter().skip(skip).cloned().collect()
    }

    /// Roster with active/inactive status. An agent is active while its
    /// last ingest is younger than `active_threshold`.
    pub async fn roster(&self, active_threshold: Duration) -> Vec<AgentRosterEntry> {
        let now = Self::now_unix();
        let threshold = active_threshold.as_secs();
        let agents = self.agents.read().await;
        let mut out = Vec::with_capacity(agents.len());
        for (id, cell) in agents.iter() {
            let record = cell.record.lock().await;
            let status = if now.saturating_sub(record.last_seen) < threshold {
                "active"
            } else {
                "inactive"
            };
            out.push(AgentRosterEntry {
                id: id.clone(),
                status,
                last_seen: record.last_seen,
                samples: record.history.len(),
                hostname: record
                    .latest
                    .as_ref()
                    .map(|s| s.system.hostname.clone()),
                metadata: record.metadata.clone(),
            });
        }
        out.sort_by(|a, b| a.id.cmp(&b.id));
        out
    }

    /// cpu/memory/disks one-liner per reporting agent.
    pub async fn summary(&self) -> BTreeMap<String, AgentSummary> {
        let agents = self.agents.read().await;
        let mut out = BTreeMap::new();
        for (id, cell) in agents.iter() {
            let record = cell.record.lock().await;
            if let Some(latest) = &record.latest {
                out.insert(
                    id.clone(),
                    AgentSummary {
                        cpu: latest.cpu.usage,
                        memory: latest.memory.used_percent,
                        disks: latest.disks.as_ref().map_or(0, |d| d.len()),
                        timestamp: latest.timestamp,
                    },
                );
            }
        }
        out
    }

    pub async fn agent_count(&self) -> usize {
        self.agents.read().await.len()
    }

    pub async fn ingest_total(&self) -> u64 {
        let agents = self.agents.read().await;
        let mut total = 0;
        for cell in agents.values() {
            total += cell.record.lock().await.ingest_count;
        }
        total
    }
}
