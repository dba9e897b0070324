// Docker control and listing handlers: thin proxies over DockerRepo.
// Destructive calls are never retried or queued here; the dashboard owns
// confirmation semantics.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use serde::Deserialize;
use std::sync::Arc;

use super::AppState;
use crate::docker_repo::DockerRepo;
use crate::error::ApiError;

fn repo(state: &AppState) -> Result<Arc<DockerRepo>, ApiError> {
    state
        .docker_repo
        .clone()
        .ok_or_else(|| ApiError::EngineUnreachable("docker engine is not available".into()))
}

/// GET /api/v1/docker/metrics — engine summary, listings and live stats.
pub(super) async fn docker_metrics(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let status = repo(&state)?.status().await?;
    Ok(axum::Json(status))
}

/// POST /api/v1/docker/container/{id}/start
pub(super) async fn start_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = repo(&state)?.start_container(&id).await?;
    tracing::info!(container_id = %id, action = "start", "container action");
    Ok(axum::Json(result))
}

/// POST /api/v1/docker/container/{id}/stop — idempotent: stopping an
/// already-exited container confirms the no-op.
pub(super) async fn stop_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = repo(&state)?.stop_container(&id).await?;
    tracing::info!(container_id = %id, action = "stop", "container action");
    Ok(axum::Json(result))
}

/// POST /api/v1/docker/container/{id}/restart
pub(super) async fn restart_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = repo(&state)?.restart_container(&id).await?;
    tracing::info!(container_id = %id, action = "restart", "container action");
    Ok(axum::Json(result))
}

/// DELETE /api/v1/docker/image/{id}
pub(super) async fn delete_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = repo(&state)?.remove_image(&id).await?;
    tracing::info!(image_id = %id, action = "delete", "image removed");
    Ok(axum::Json(result))
}

/// DELETE /api/v1/docker/volume/{name}
pub(super) async fn delete_volume(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let result = repo(&state)?.remove_volume(&name).await?;
    tracing::info!(volume = %name, action = "delete", "volume removed");
    Ok(axum::Json(result))
}

#[derive(Debug, Deserialize)]
pub(super) struct ScanRequest {
    image_name: String,
}

/// POST /api/v1/docker/image/scan — Trivy vulnerability scan by image name.
/// Scan failures come back in the report body, not as HTTP errors.
pub(super) async fn scan_image(
    State(state): State<AppState>,
    payload: Result<axum::Json<ScanRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let axum::Json(request) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let image = request.image_name.trim();
    if image.is_empty() {
        return Err(ApiError::Validation("image_name is required".into()));
    }
    let report = state.scanner.scan_image(image).await;
    Ok(axum::Json(report))
}
