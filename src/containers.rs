// ABOUTME: Pauses and resumes the Docker workloads that touch a job's source data
// ABOUTME: Only containers this tool actually stopped are handed back for restart

use async_trait::async_trait;
use bollard::errors::Error as BollardError;
use bollard::query_parameters::{
    ListContainersOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::Docker;
use tracing::{error, info};

use crate::error::{Result, SyncError};

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Names of the containers currently running.
    async fn running_containers(&self) -> Result<Vec<String>>;

    async fn stop(&self, name: &str) -> Result<()>;

    async fn start(&self, name: &str) -> Result<()>;
}

pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    pub fn connect() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()
            .map_err(|e| SyncError::ContainerRuntime(format!("Docker connection failed: {}", e)))?;
        Ok(Self { docker })
    }
}

fn docker_error(name: &str, err: BollardError) -> SyncError {
    match err {
        BollardError::DockerResponseServerError {
            status_code: 404, ..
        } => SyncError::ContainerNotFound(name.to_string()),
        other => SyncError::ContainerRuntime(format!("{}: {}", name, other)),
    }
}

#[async_trait]
impl ContainerRuntime for DockerRuntime {
    async fn running_containers(&self) -> Result<Vec<String>> {
        let options = ListContainersOptions {
            all: false,
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| SyncError::ContainerRuntime(format!("Failed to list containers: {}", e)))?;

        // Docker reports names with a leading slash
        Ok(containers
            .into_iter()
            .filter_map(|c| c.names)
            .flatten()
            .map(|name| name.trim_start_matches('/').to_string())
            .collect())
    }

    async fn stop(&self, name: &str) -> Result<()> {
        self.docker
            .stop_container(name, None::<StopContainerOptions>)
            .await
            .map_err(|e| docker_error(name, e))
    }

    async fn start(&self, name: &str) -> Result<()> {
        self.docker
            .start_container(name, None::<StartContainerOptions>)
            .await
            .map_err(|e| docker_error(name, e))
    }
}

pub struct ContainerLifecycleManager<R> {
    runtime: R,
}

impl<R: ContainerRuntime> ContainerLifecycleManager<R> {
    pub fn new(runtime: R) -> Self {
        Self { runtime }
    }

    /// Stops the requested containers that are currently running and returns
    /// the ones that were stopped, in request order. Requested names that are
    /// not running are skipped. If a stop fails, the containers stopped so far
    /// are started again and the error is returned.
    pub async fn stop(&self, names: &[String]) -> Result<Vec<String>> {
        let mut stopped = Vec::new();
        if names.is_empty() {
            return Ok(stopped);
        }

        info!("Stopping containers: {:?}", names);
        let running = self.runtime.running_containers().await?;

        for name in names {
            if !running.contains(name) {
                info!("Container {} is not running, leaving it alone", name);
                continue;
            }
            info!("Stopping container: {}", name);
            if let Err(e) = self.runtime.stop(name).await {
                // a workload still writing to the source must not be synced
                error!("Failed to stop container {}: {}", name, e);
                if let Err(restart) = self.start(&stopped).await {
                    error!("Failed to bring back containers after aborted stop: {}", restart);
                    return Err(restart);
                }
                return Err(e);
            }
            stopped.push(name.clone());
        }

        Ok(stopped)
    }

    /// Starts every named container. A failure does not prevent the remaining
    /// containers from being started; the first error is returned afterwards.
    pub async fn start(&self, names: &[String]) -> Result<()> {
        if names.is_empty() {
            return Ok(());
        }

        info!("Starting containers: {:?}", names);
        let mut first_error = None;
        for name in names {
            info!("Starting container: {}", name);
            if let Err(e) = self.runtime.start(name).await {
                error!("Failed to start container {}: {}", name, e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
