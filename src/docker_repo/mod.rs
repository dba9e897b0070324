// Docker engine proxy via bollard: listings, per-container stats streams,
// and container/image/volume lifecycle calls. Stateless with respect to
// container state; the engine is always authoritative.

mod stats;

use crate::error::ApiError;
use crate::models::{
    ContainerActionResult, ContainerInfo, ContainerState, ContainerStats, DockerStatus,
    EngineInfo, ImageInfo, NetworkInfo, VolumeInfo,
};
use bollard::Docker;
use bollard::query_parameters::{
    ListContainersOptions, ListImagesOptions, ListNetworksOptions, ListVolumesOptions,
    RemoveImageOptions, RemoveVolumeOptions, RestartContainerOptions, StatsOptions,
    StopContainerOptions,
};
use futures_util::StreamExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::warn;

pub struct DockerRepo {
    docker: Docker,
    stop_timeout_secs: u32,
    live_stats: Arc<RwLock<HashMap<String, ContainerStats>>>,
    active_streams: Arc<RwLock<HashMap<String, tokio::task::JoinHandle<()>>>>,
}

/// Map a bollard error on a specific resource to the service taxonomy.
fn classify(kind: &'static str, id: &str, e: bollard::errors::Error) -> ApiError {
    match e {
        bollard::errors::Error::DockerResponseServerError {
            status_code,
            message,
        } => match status_code {
            404 => ApiError::NotFound(kind, id.to_string()),
            409 => ApiError::Conflict(message),
            401 | 403 => ApiError::PermissionDenied(message),
            _ => ApiError::Internal(message),
        },
        other => ApiError::EngineUnreachable(other.to_string()),
    }
}

/// Map a bollard error on an engine-wide call (info, listings).
fn engine_error(e: bollard::errors::Error) -> ApiError {
    match e {
        bollard::errors::Error::DockerResponseServerError { message, .. } => {
            ApiError::Internal(message)
        }
        other => ApiError::EngineUnreachable(other.to_string()),
    }
}

impl DockerRepo {
    pub fn connect(stop_timeout_secs: u32) -> anyhow::Result<Self> {
        let docker = Docker::connect_with_unix_defaults()?;
        Ok(Self {
            docker,
            stop_timeout_secs,
            live_stats: Arc::new(RwLock::new(HashMap::new())),
            active_streams: Arc::new(RwLock::new(HashMap::new())),
        })
    }

    pub async fn ping(&self) -> Result<(), ApiError> {
        self.docker.ping().await.map_err(engine_error)?;
        Ok(())
    }

    /// Engine summary + listings + cached live stats, for GET /api/v1/docker/metrics.
    pub async fn status(&self) -> Result<DockerStatus, ApiError> {
        let info = self.docker.info().await.map_err(engine_error)?;
        let version = self.docker.version().await.map_err(engine_error)?;

        let engine = EngineInfo {
            server_version: info.server_version.unwrap_or_default(),
            api_version: version.api_version.unwrap_or_default(),
            os_type: info.os_type.unwrap_or_default(),
            operating_system: info.operating_system.unwrap_or_default(),
            arch: info.architecture.unwrap_or_default(),
            kernel_version: info.kernel_version.unwrap_or_default(),
            containers: info.containers.unwrap_or(0).max(0) as u32,
            containers_running: info.containers_running.unwrap_or(0).max(0) as u32,
            containers_paused: info.containers_paused.unwrap_or(0).max(0) as u32,
            containers_stopped: info.containers_stopped.unwrap_or(0).max(0) as u32,
            images: info.images.unwrap_or(0).max(0) as u32,
            storage_driver: info.driver.unwrap_or_default(),
            mem_total: info.mem_total.unwrap_or(0).max(0) as u64,
            n_cpu: info.ncpu.unwrap_or(0).max(0) as u32,
        };

        let containers = self.list_containers().await?;
        let container_stats = self.refresh_stats_streams(&containers).await;

        let images = self
            .docker
            .list_images(Some(ListImagesOptions {
                all: false,
                ..Default::default()
            }))
            .await
            .map_err(engine_error)?
            .into_iter()
            .map(|i| ImageInfo {
                id: i.id,
                repo_tags: i.repo_tags,
                created: i.created,
                size: i.size,
                containers: i.containers,
            })
            .collect();

        let networks = self
            .docker
            .list_networks(None::<ListNetworksOptions>)
            .await
            .map_err(engine_error)?
            .into_iter()
            .map(|n| NetworkInfo {
                id: n.id.unwrap_or_default(),
                name: n.name.unwrap_or_default(),
                driver: n.driver.unwrap_or_default(),
                scope: n.scope.unwrap_or_default(),
            })
            .collect();

        let volumes = self
            .docker
            .list_volumes(None::<ListVolumesOptions>)
            .await
            .map_err(engine_error)?
            .volumes
            .unwrap_or_default()
            .into_iter()
            .map(|v| VolumeInfo {
                name: v.name,
                driver: v.driver,
                mountpoint: v.mountpoint,
                scope: v.scope.map(|s| s.to_string()).unwrap_or_default(),
            })
            .collect();

        Ok(DockerStatus {
            engine,
            containers,
            container_stats,
            images,
            networks,
            volumes,
        })
    }

    async fn list_containers(&self) -> Result<Vec<ContainerInfo>, ApiError> {
        let options = ListContainersOptions {
            all: true,
            ..Default::default()
        };
        let summaries = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(engine_error)?;

        let mut out = Vec::with_capacity(summaries.len());
        for c in summaries {
            let state = c
                .state
                .as_ref()
                .map(|s| s.to_string())
                .unwrap_or_default();
            out.push(ContainerInfo {
                id: c.id.unwrap_or_default(),
                names: c
                    .names
                    .unwrap_or_default()
                    .into_iter()
                    .map(|n| n.trim_start_matches('/').to_string())
                    .collect(),
                image: c.image.unwrap_or_default(),
                image_id: c.image_id.unwrap_or_default(),
                command: c.command.unwrap_or_default(),
                created: c.created.unwrap_or(0),
                state: ContainerState::from_docker(&state),
                status: c.status.unwrap_or_default(),
            });
        }
        Ok(out)
    }

    /// Reconcile per-container stats streams with the running set, then
    /// return the cached readings. A fresh stream needs two samples before
    /// its CPU delta is meaningful, so a container may be absent from the
    /// first status call after it starts.
    async fn refresh_stats_streams(&self, containers: &[ContainerInfo]) -> Vec<ContainerStats> {
        let mut running_ids = Vec::new();
        let mut id_to_name = HashMap::new();
        for c in containers {
            if c.state == ContainerState::Running {
                let name = c.names.first().cloned().unwrap_or_else(|| c.id.clone());
                running_ids.push(c.id.clone());
                id_to_name.insert(c.id.clone(), name);
            }
        }
        let running_set: HashSet<String> = running_ids.iter().cloned().collect();

        let current_keys: Vec<String> = {
            let r = self.active_streams.read().await;
            r.keys().cloned().collect()
        };

        let to_add: Vec<(String, String)> = running_ids
            .into_iter()
            .filter(|id| !current_keys.contains(id))
            .map(|id| {
                let name = id_to_name.get(&id).cloned().unwrap_or_else(|| id.clone());
                (id, name)
            })
            .collect();
        let to_remove: Vec<String> = current_keys
            .into_iter()
            .filter(|id| !running_set.contains(id))
            .collect();

        let new_handles: Vec<(String, tokio::task::JoinHandle<()>)> = {
            let mut out = Vec::with_capacity(to_add.len());
            for (id, name) in to_add {
                let handle = self.start_monitoring(id.clone(), name).await;
                out.push((id, handle));
            }
            out
        };

        {
            let mut streams = self.active_streams.write().await;
            for (id, handle) in new_handles {
                streams.insert(id, handle);
            }
            for id in &to_remove {
                if let Some(handle) = streams.remove(id) {
                    handle.abort();
                }
            }
        }
        if !to_remove.is_empty() {
            let mut live = self.live_stats.write().await;
            for id in &to_remove {
                live.remove(id);
            }
        }

        let live = self.live_stats.read().await;
        live.values().cloned().collect()
    }

    async fn start_monitoring(&self, id: String, name: String) -> tokio::task::JoinHandle<()> {
        let docker = self.docker.clone();
        let live_stats = self.live_stats.clone();
        let active_streams = self.active_streams.clone();

        tokio::spawn(async move {
            let options = StatsOptions {
                stream: true,
                ..Default::default()
            };
            let mut stream = docker.stats(&id, Some(options));

            while let Some(result) = stream.next().await {
                match result {
                    Ok(s) => {
                        if let Some(stats) = stats::process_statistics(&s, &id, &name) {
                            live_stats.write().await.insert(id.clone(), stats);
                        }
                    }
                    Err(e) => {
                        warn!("Stats stream error for container {}: {}", name, e);
                        break;
                    }
                }
            }
            tracing::info!("Stats stream ended for container {}", name);
            active_streams.write().await.remove(&id);
        })
    }

    pub async fn start_container(&self, id: &str) -> Result<ContainerActionResult, ApiError> {
        use bollard::query_parameters::StartContainerOptions;
        match self
            .docker
            .start_container(id, None::<StartContainerOptions>)
            .await
        {
            Ok(()) => Ok(ContainerActionResult::success(
                "start",
                id,
                format!("Container {} started", id),
            )),
            // 304: engine says it is already running; treat as a no-op confirmation
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(ContainerActionResult::success(
                "start",
                id,
                format!("Container {} already running", id),
            )),
            Err(e) => Err(classify("container", id, e)),
        }
    }

    pub async fn stop_container(&self, id: &str) -> Result<ContainerActionResult, ApiError> {
        let options = StopContainerOptions {
            t: Some(self.stop_timeout_secs as i32),
            ..Default::default()
        };
        match self.docker.stop_container(id, Some(options)).await {
            Ok(()) => Ok(ContainerActionResult::success(
                "stop",
                id,
                format!("Container {} stopped", id),
            )),
            // 304: already exited; a stop on a stopped container is not an error
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 304, ..
            }) => Ok(ContainerActionResult::success(
                "stop",
                id,
                format!("Container {} already stopped", id),
            )),
            Err(e) => Err(classify("container", id, e)),
        }
    }

    pub async fn restart_container(&self, id: &str) -> Result<ContainerActionResult, ApiError> {
        let options = RestartContainerOptions {
            t: Some(self.stop_timeout_secs as i32),
            ..Default::default()
        };
        match self.docker.restart_container(id, Some(options)).await {
            Ok(()) => Ok(ContainerActionResult::success(
                "restart",
                id,
                format!("Container {} restarted", id),
            )),
            Err(e) => Err(classify("container", id, e)),
        }
    }

    /// Non-forced remove: an image still used by a container is reported
    /// as a conflict rather than deleted out from under it.
    pub async fn remove_image(&self, id: &str) -> Result<ContainerActionResult, ApiError> {
        match self
            .docker
            .remove_image(id, None::<RemoveImageOptions>, None)
            .await
        {
            Ok(_) => Ok(ContainerActionResult::success(
                "delete",
                id,
                format!("Image {} deleted", id),
            )),
            Err(e) => Err(classify("image", id, e)),
        }
    }

    pub async fn remove_volume(&self, name: &str) -> Result<ContainerActionResult, ApiError> {
        match self
            .docker
            .remove_volume(name, None::<RemoveVolumeOptions>)
            .await
        {
            Ok(()) => Ok(ContainerActionResult::success(
                "delete",
                name,
                format!("Volume {} deleted", name),
            )),
            Err(e) => Err(classify("volume", name, e)),
        }
    }
}
