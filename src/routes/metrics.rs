// Ingestion, query, health and roster handlers

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::error::ApiError;
use crate::host_repo::HostRepo;
use crate::models::AgentSnapshot;
use crate::store::MetricsUpdate;
use crate::version::{NAME, VERSION};

/// GET / — service banner and endpoint map.
pub(super) async fn root_handler() -> impl IntoResponse {
    axum::Json(json!({
        "message": format!("Welcome to {} v{}", NAME, VERSION),
        "version": VERSION,
        "endpoints": {
            "health": "/api/v1/health",
            "metrics": "/api/v1/metrics",
            "latest": "/api/v1/metrics/latest",
            "history": "/api/v1/metrics/history",
            "agents": "/api/v1/agents",
            "docker": "/api/v1/docker/metrics",
            "ws": "/ws/metrics",
        },
    }))
}

/// GET /version — returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// POST /api/v1/metrics — accept one snapshot from an agent.
/// Typed deserialization is the validation: missing/mistyped required
/// fields never reach the store.
pub(super) async fn ingest(
    State(state): State<AppState>,
    payload: Result<axum::Json<AgentSnapshot>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let axum::Json(snapshot) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    if snapshot.agent_id.trim().is_empty() {
        return Err(ApiError::Validation("agent_id must be non-empty".into()));
    }

    let agent_id = snapshot.agent_id.clone();
    let disks = snapshot.disks.as_ref().map_or(0, |d| d.len());
    let has_network = snapshot.network.is_some();
    let processes = snapshot.processes.as_ref().map_or(0, |p| p.len());
    let has_docker = snapshot.docker.is_some();

    let stored = state.store.ingest(snapshot).await;
    tracing::debug!(
        agent_id = %agent_id,
        cpu = stored.cpu.usage,
        memory = stored.memory.used_percent,
        "metrics received"
    );
    // Fan-out is best-effort; no subscribers is the normal idle state.
    let _ = state.update_tx.send(MetricsUpdate {
        agent_id: agent_id.clone(),
        snapshot: stored,
    });

    Ok(axum::Json(json!({
        "status": "received",
        "agent_id": agent_id,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "metrics_received": {
            "cpu": true,
            "memory": true,
            "disks": disks,
            "network": has_network,
            "processes": processes,
            "docker": has_docker,
        },
    })))
}

#[derive(Debug, Deserialize)]
pub(super) struct LatestParams {
    agent_id: Option<String>,
}

/// GET /api/v1/metrics/latest — full latest view, or one agent's snapshot
/// with ?agent_id=. An empty store answers with an explicit marker so
/// callers can tell "no data yet" from "service down".
pub(super) async fn latest(
    State(state): State<AppState>,
    Query(params): Query<LatestParams>,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(agent_id) = params.agent_id {
        let snapshot = state
            .store
            .latest_for(&agent_id)
            .await
            .ok_or_else(|| ApiError::NotFound("agent", agent_id.clone()))?;
        let value = serde_json::to_value(snapshot.as_ref())
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        return Ok(axum::Json(value));
    }

    let latest = state.store.latest().await;
    if latest.is_empty() {
        return Ok(axum::Json(json!({ "message": "No metrics available" })));
    }
    let mut out = serde_json::Map::with_capacity(latest.len());
    for (agent_id, snapshot) in latest {
        out.insert(
            agent_id,
            serde_json::to_value(snapshot.as_ref())
                .map_err(|e| ApiError::Internal(e.to_string()))?,
        );
    }
    Ok(axum::Json(serde_json::Value::Object(out)))
}

#[derive(Debug, Deserialize)]
pub(super) struct HistoryParams {
    agent_id: String,
    limit: Option<usize>,
}

/// GET /api/v1/metrics/history — up to `limit` most recent snapshots for
/// one agent, oldest first. Unknown agents get [] rather than 404.
pub(super) async fn history(
    State(state): State<AppState>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::Validation(e.body_text()))?;
    let limit = params
        .limit
        .unwrap_or(state.config.store.default_query_limit);
    let history = state.store.history(&params.agent_id, limit).await;
    let mut out = Vec::with_capacity(history.len());
    for snapshot in history {
        out.push(
            serde_json::to_value(snapshot.as_ref())
                .map_err(|e| ApiError::Internal(e.to_string()))?,
        );
    }
    Ok(axum::Json(serde_json::Value::Array(out)))
}

/// GET /api/v1/health — service identity, host system block, active agent
/// roster and per-agent summary.
pub(super) async fn health(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let host = state.host_repo.status().await?;
    let threshold = std::time::Duration::from_secs(state.config.store.active_threshold_secs);
    let roster = state.store.roster(threshold).await;
    let active: Vec<_> = roster.into_iter().filter(|a| a.status == "active").collect();
    let summary = state.store.summary().await;

    let docker_status = match &state.docker_repo {
        Some(repo) => match repo.ping().await {
            Ok(()) => "running",
            Err(_) => "unreachable",
        },
        None => "not_available",
    };

    Ok(axum::Json(json!({
        "status": "healthy",
        "service": NAME,
        "version": VERSION,
        "hostname": HostRepo::hostname(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "system": host,
        "services": { "docker": docker_status },
        "agents": active,
        "metrics_summary": summary,
    })))
}

#[derive(Debug, Deserialize)]
pub(super) struct AgentsParams {
    status: Option<String>,
}

/// GET /api/v1/agents — full roster, optionally filtered by status.
pub(super) async fn agents(
    State(state): State<AppState>,
    Query(params): Query<AgentsParams>,
) -> Result<impl IntoResponse, ApiError> {
    let threshold = std::time::Duration::from_secs(state.config.store.active_threshold_secs);
    let mut roster = state.store.roster(threshold).await;
    if let Some(filter) = &params.status {
        roster.retain(|a| a.status == filter);
    }
    let active_count = roster.iter().filter(|a| a.status == "active").count();
    Ok(axum::Json(json!({
        "count": roster.len(),
        "agents": roster,
        "active_count": active_count,
    })))
}

/// POST /api/v1/agents/register — attach descriptive metadata to an agent.
pub(super) async fn register_agent(
    State(state): State<AppState>,
    payload: Result<axum::Json<serde_json::Value>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let axum::Json(data) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let agent_id = data
        .get("agent_id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("agent_id is required".into()))?
        .to_string();

    state.store.register(&agent_id, data).await;
    tracing::info!(agent_id = %agent_id, "agent registered");

    Ok(axum::Json(json!({
        "status": "registered",
        "agent_id": agent_id,
        "message": format!("Agent {} registered successfully", agent_id),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}
