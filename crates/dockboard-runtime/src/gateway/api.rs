//! Runtime gateway backed by the Docker Engine API (`bollard`).
//!
//! `bollard` is asynchronous; the gateway contract is blocking. The
//! gateway owns a small tokio runtime and drives each request to
//! completion on it, bounded by a timeout.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, RestartContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::HostConfig;
use dockboard_common::error::{DockboardError, Result};
use dockboard_common::types::{Container, ContainerId, ImageRef};
use futures_util::StreamExt;
use tokio::runtime::Runtime;

use super::{ContainerSpec, RuntimeGateway};
use crate::convert::{bindings_to_port_map, container_from_inspect};

const WORKER_THREADS: usize = 2;

/// Gateway talking to the Engine API over the local socket.
pub struct DockerApiGateway {
    docker: Docker,
    runtime: Option<Runtime>,
    timeout: Duration,
    pull_timeout: Duration,
}

impl DockerApiGateway {
    /// Connects using the local defaults (`DOCKER_HOST` or the platform
    /// socket).
    ///
    /// # Errors
    ///
    /// Returns `RuntimeUnavailable` if the I/O runtime cannot be built or
    /// the client cannot be configured.
    pub fn connect(timeout: Duration, pull_timeout: Duration) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(WORKER_THREADS)
            .thread_name("dockboard-engine-api")
            .enable_all()
            .build()
            .map_err(|e| DockboardError::runtime(format!("failed to start API client runtime: {e}")))?;

        let docker = {
            let _guard = runtime.enter();
            Docker::connect_with_local_defaults()
                .map_err(|e| DockboardError::runtime(format!("failed to connect to Docker: {e}")))?
                .with_timeout(pull_timeout.max(timeout))
        };

        Ok(Self {
            docker,
            runtime: Some(runtime),
            timeout,
            pull_timeout,
        })
    }

    /// Drives `fut` to completion within `timeout`.
    fn block_on<T, F>(&self, what: &str, timeout: Duration, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let runtime = self
            .runtime
            .as_ref()
            .ok_or_else(|| DockboardError::runtime("API client runtime has shut down"))?;
        runtime.block_on(async {
            tokio::time::timeout(timeout, fut).await.unwrap_or_else(|_| {
                Err(DockboardError::runtime(format!(
                    "{what} timed out after {}s",
                    timeout.as_secs_f32()
                )))
            })
        })
    }

    fn lifecycle(&self, action: &'static str, id: &ContainerId) -> Result<()> {
        tracing::info!(id = %id, action, "container lifecycle call (api)");
        let docker = self.docker.clone();
        let target = id.as_str();
        self.block_on(action, self.timeout, async move {
            let outcome = match action {
                "start" => {
                    docker
                        .start_container(target, None::<StartContainerOptions<String>>)
                        .await
                }
                "stop" => docker.stop_container(target, None::<StopContainerOptions>).await,
                "restart" => {
                    docker
                        .restart_container(target, None::<RestartContainerOptions>)
                        .await
                }
                _ => docker.remove_container(target, None::<RemoveContainerOptions>).await,
            };
            outcome.map_err(|e| map_docker_error(e, "container", target))
        })
    }
}

impl Drop for DockerApiGateway {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl RuntimeGateway for DockerApiGateway {
    fn backend_name(&self) -> &'static str {
        "api"
    }

    fn list_containers(&self, include_stopped: bool) -> Result<Vec<Container>> {
        let docker = self.docker.clone();
        self.block_on("list containers", self.timeout, async move {
            let options = ListContainersOptions::<String> {
                all: include_stopped,
                ..Default::default()
            };
            let summaries = docker
                .list_containers(Some(options))
                .await
                .map_err(|e| map_docker_error(e, "containers", "list"))?;

            let mut tag_cache: HashMap<String, Vec<String>> = HashMap::new();
            let mut containers = Vec::with_capacity(summaries.len());
            for id in summaries.into_iter().filter_map(|s| s.id) {
                match inspect(&docker, &id, &mut tag_cache).await {
                    Ok(container) => containers.push(container),
                    Err(DockboardError::NotFound { .. }) => {
                        tracing::debug!(id = %id, "container vanished while listing");
                    }
                    Err(e) => return Err(e),
                }
            }
            Ok(containers)
        })
    }

    fn get_container(&self, id: &str) -> Result<Container> {
        let docker = self.docker.clone();
        self.block_on("inspect container", self.timeout, async move {
            inspect(&docker, id, &mut HashMap::new()).await
        })
    }

    fn start(&self, id: &ContainerId) -> Result<()> {
        self.lifecycle("start", id)
    }

    fn stop(&self, id: &ContainerId) -> Result<()> {
        self.lifecycle("stop", id)
    }

    fn restart(&self, id: &ContainerId) -> Result<()> {
        self.lifecycle("restart", id)
    }

    fn pull_image(&self, reference: &str) -> Result<()> {
        tracing::info!(image = %reference, "pulling image (api)");
        let image = ImageRef::parse(reference);
        let docker = self.docker.clone();
        self.block_on("image pull", self.pull_timeout, async move {
            let options = CreateImageOptions {
                from_image: image.repository.clone(),
                tag: image.tag.clone(),
                ..Default::default()
            };
            let mut progress = docker.create_image(Some(options), None, None);
            while let Some(update) = progress.next().await {
                let _ = update.map_err(|e| map_docker_error(e, "image", reference))?;
            }
            Ok(())
        })
    }

    fn remove_container(&self, id: &ContainerId) -> Result<()> {
        self.lifecycle("remove", id)
    }

    fn create_container(&self, spec: &ContainerSpec) -> Result<Container> {
        tracing::info!(name = %spec.name, image = %spec.image, "creating container (api)");
        let docker = self.docker.clone();
        let (exposed_ports, port_bindings) = bindings_to_port_map(&spec.port_bindings);
        let config = Config::<String> {
            image: Some(spec.image.clone()),
            env: Some(spec.env.clone()),
            labels: Some(spec.labels.clone().into_iter().collect()),
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                binds: Some(spec.binds.clone()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            platform: None,
        };
        self.block_on("create container", self.timeout, async move {
            let created = docker
                .create_container(Some(options), config)
                .await
                .map_err(|e| map_docker_error(e, "image", &spec.image))?;
            for warning in &created.warnings {
                tracing::warn!(name = %spec.name, warning = %warning, "runtime warning on create");
            }
            inspect(&docker, &created.id, &mut HashMap::new()).await
        })
    }
}

/// Inspects a container and its image's repository tags.
async fn inspect(
    docker: &Docker,
    id: &str,
    tag_cache: &mut HashMap<String, Vec<String>>,
) -> Result<Container> {
    let inspected = docker
        .inspect_container(id, None::<InspectContainerOptions>)
        .await
        .map_err(|e| map_docker_error(e, "container", id))?;

    let tags = match inspected.image.as_deref() {
        Some(image_id) => {
            if let Some(tags) = tag_cache.get(image_id) {
                tags.clone()
            } else {
                let tags = match docker.inspect_image(image_id).await {
                    Ok(image) => image.repo_tags.unwrap_or_default(),
                    Err(e) => {
                        tracing::warn!(image = %image_id, error = %e, "could not read image tags");
                        Vec::new()
                    }
                };
                let _ = tag_cache.insert(image_id.to_string(), tags.clone());
                tags
            }
        }
        None => Vec::new(),
    };

    container_from_inspect(inspected, tags)
}

/// Maps an Engine API error into the workspace taxonomy.
fn map_docker_error(err: bollard::errors::Error, kind: &'static str, id: &str) -> DockboardError {
    match err {
        bollard::errors::Error::DockerResponseServerError {
            status_code: 404, ..
        } => DockboardError::NotFound {
            kind,
            id: id.to_string(),
        },
        bollard::errors::Error::DockerResponseServerError {
            status_code: 304, ..
        } => DockboardError::Validation {
            message: format!("{kind} {id} is already in the requested state"),
        },
        bollard::errors::Error::DockerResponseServerError {
            status_code: 409,
            message,
        } => DockboardError::Validation { message },
        other => DockboardError::runtime(other.to_string()),
    }
}
