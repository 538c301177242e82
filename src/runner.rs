// ABOUTME: Runs a single sync job end to end against rclone and Docker
// ABOUTME: Containers and engine options are always put back, whatever the sync outcome

use chrono::NaiveDate;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{JobSpec, MirrorConfig};
use crate::containers::{ContainerLifecycleManager, ContainerRuntime};
use crate::error::Result;
use crate::remote::{RemoteControl, RemoteOptions, SyncJobHandle};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Everything the runner needs to execute one sync.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub name: String,
    pub source_fs: String,
    pub destination_fs: String,
    pub options: RemoteOptions,
    pub containers_to_stop: Vec<String>,
    pub timeout: Option<Duration>,
}

impl SyncPlan {
    pub fn for_job(job: &JobSpec, timeout: Option<Duration>, today: NaiveDate) -> Self {
        Self {
            name: job.name.clone(),
            source_fs: job.source_path.clone(),
            destination_fs: job.destination_fs(),
            options: RemoteOptions::for_job(
                &job.destination_remote,
                &job.destination_folder,
                job.transfers,
                today,
            ),
            containers_to_stop: job.containers_to_stop.clone(),
            timeout,
        }
    }

    /// Whole-remote mirror: no archive directory, no paused containers, no timeout.
    pub fn for_mirror(mirror: &MirrorConfig) -> Self {
        Self {
            name: format!(
                "mirror:{}->{}",
                mirror.source_remote, mirror.destination_remote
            ),
            source_fs: format!("{}:", mirror.source_remote),
            destination_fs: format!("{}:", mirror.destination_remote),
            options: RemoteOptions::without_archive(mirror.transfers),
            containers_to_stop: Vec::new(),
            timeout: None,
        }
    }
}

/// How a sync that ran to a terminal state ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    pub successful: bool,
    pub error_message: String,
    pub timed_out: bool,
}

pub struct JobRunner<C, R> {
    control: C,
    containers: ContainerLifecycleManager<R>,
    poll_interval: Duration,
}

impl<C: RemoteControl, R: ContainerRuntime> JobRunner<C, R> {
    pub fn new(control: C, runtime: R, poll_interval: Duration) -> Self {
        Self {
            control,
            containers: ContainerLifecycleManager::new(runtime),
            poll_interval,
        }
    }

    /// Runs one job. Takes `&mut self` so a runner only ever has one job
    /// holding the engine's global options.
    ///
    /// A sync that fails or times out is reported through [`JobOutcome`].
    /// `Err` means the job could not be carried out, or that a container could
    /// not be restarted afterwards.
    pub async fn run(&mut self, plan: &SyncPlan) -> Result<JobOutcome> {
        info!(
            "Starting job {}, src: {}, dest: {}, timeout: {:?}",
            plan.name, plan.source_fs, plan.destination_fs, plan.timeout
        );

        let prior = self.control.get_options().await?;
        debug!("Engine options before {}: {:?}", plan.name, prior);

        let stopped = self.containers.stop(&plan.containers_to_stop).await?;

        let outcome = self.sync(plan).await;
        if let Err(e) = &outcome {
            error!("Job {} failed: {}", plan.name, e);
        }

        let restarted = self.containers.start(&stopped).await;

        let restored = self.control.set_options(&prior).await;
        if let Err(e) = &restored {
            error!(
                "Failed to restore engine options {:?} after {}: {}",
                prior, plan.name, e
            );
        }

        restarted?;
        let outcome = outcome?;
        restored?;
        Ok(outcome)
    }

    async fn sync(&self, plan: &SyncPlan) -> Result<JobOutcome> {
        self.control.set_options(&plan.options).await?;
        let handle = self
            .control
            .start_sync(&plan.source_fs, &plan.destination_fs)
            .await?;
        info!("Running job: {}", handle);

        self.poll_for_completion(handle, plan.timeout).await
    }

    async fn poll_for_completion(
        &self,
        handle: SyncJobHandle,
        timeout: Option<Duration>,
    ) -> Result<JobOutcome> {
        let started = Instant::now();
        let mut last_error = String::new();

        loop {
            sleep(self.poll_interval).await;

            if let Some(timeout) = timeout {
                if started.elapsed() > timeout {
                    warn!("Job {} has timed out, cancelling...", handle);
                    self.cancel(handle).await;
                    return Ok(JobOutcome {
                        successful: false,
                        error_message: last_error,
                        timed_out: true,
                    });
                }
            }

            let status = match self.control.get_status(handle).await {
                Ok(status) => status,
                Err(e) => {
                    // the sync must not outlive its checkout of the engine options
                    error!("Lost track of job {}, cancelling it: {}", handle, e);
                    self.cancel(handle).await;
                    return Err(e);
                }
            };
            if status.finished {
                if status.success {
                    info!("Job {} done", handle);
                } else {
                    warn!("Job {} finished unsuccessfully: {}", handle, status.error);
                }
                return Ok(JobOutcome {
                    successful: status.success,
                    error_message: status.error,
                    timed_out: false,
                });
            }

            if !status.error.is_empty() {
                last_error = status.error;
            }
            debug!("Job {} not done, checking again soon...", handle);
        }
    }

    async fn cancel(&self, handle: SyncJobHandle) {
        match self.control.cancel(handle).await {
            Ok(finished) => debug!("Cancel of job {} acknowledged, finished: {}", handle, finished),
            Err(e) => error!("Failed to cancel job {}: {}", handle, e),
        }
    }
}
