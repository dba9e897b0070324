// HTTP + WebSocket routes

mod docker;
mod metrics;
mod ws;

use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::docker_repo::DockerRepo;
use crate::host_repo::HostRepo;
use crate::scanner::TrivyScanner;
use crate::store::{MetricsStore, MetricsUpdate};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) store: Arc<MetricsStore>,
    /// None when the engine was unreachable at startup; Docker endpoints
    /// then answer 503 instead of taking the whole service down.
    pub(crate) docker_repo: Option<Arc<DockerRepo>>,
    pub(crate) host_repo: Arc<HostRepo>,
    pub(crate) scanner: Arc<TrivyScanner>,
    pub(crate) update_tx: broadcast::Sender<MetricsUpdate>,
    pub(crate) ws_metrics_connections: Arc<AtomicUsize>,
    pub(crate) config: AppConfig,
}

pub fn app(
    store: Arc<MetricsStore>,
    docker_repo: Option<Arc<DockerRepo>>,
    host_repo: Arc<HostRepo>,
    scanner: Arc<TrivyScanner>,
    update_tx: broadcast::Sender<MetricsUpdate>,
    ws_metrics_connections: Arc<AtomicUsize>,
    config: AppConfig,
) -> Router {
    let state = AppState {
        store,
        docker_repo,
        host_repo,
        scanner,
        update_tx,
        ws_metrics_connections,
        config,
    };
    Router::new()
        .route("/", get(metrics::root_handler)) // GET /
        .route("/version", get(metrics::version_handler)) // GET /version
        .route("/api/v1/metrics", post(metrics::ingest)) // POST /api/v1/metrics
        .route("/api/v1/metrics/latest", get(metrics::latest)) // GET /api/v1/metrics/latest
        .route("/api/v1/metrics/history", get(metrics::history)) // GET /api/v1/metrics/history
        .route("/api/v1/health", get(metrics::health)) // GET /api/v1/health
        .route("/api/v1/agents", get(metrics::agents)) // GET /api/v1/agents
        .route("/api/v1/agents/register", post(metrics::register_agent)) // POST /api/v1/agents/register
        .route("/api/v1/docker/metrics", get(docker::docker_metrics)) // GET /api/v1/docker/metrics
        .route(
            "/api/v1/docker/container/{id}/start",
            post(docker::start_container),
        )
        .route(
            "/api/v1/docker/container/{id}/stop",
            post(docker::stop_container),
        )
        .route(
            "/api/v1/docker/container/{id}/restart",
            post(docker::restart_container),
        )
        .route("/api/v1/docker/image/{id}", delete(docker::delete_image))
        .route("/api/v1/docker/volume/{name}", delete(docker::delete_volume))
        .route("/api/v1/docker/image/scan", post(docker::scan_image))
        .route("/ws/metrics", get(ws::ws_metrics)) // WS /ws/metrics
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
