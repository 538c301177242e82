// ABOUTME: In-memory stand-ins for the rclone engine and the Docker host
// ABOUTME: Used by unit tests to script job statuses and inspect side effects

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::containers::ContainerRuntime;
use crate::error::{Result, SyncError};
use crate::remote::{JobStatus, RemoteControl, RemoteOptions, SyncJobHandle};

pub fn running() -> JobStatus {
    JobStatus {
        finished: false,
        success: false,
        error: String::new(),
    }
}

pub fn finished(success: bool, error: &str) -> JobStatus {
    JobStatus {
        finished: true,
        success,
        error: error.to_string(),
    }
}

struct EngineState {
    options: RemoteOptions,
    options_set: Vec<RemoteOptions>,
    statuses: VecDeque<JobStatus>,
    status_calls: usize,
    syncs: Vec<(String, String)>,
    cancels: Vec<SyncJobHandle>,
    next_job_id: u64,
    start_error: Option<SyncError>,
    options_error: Option<SyncError>,
    status_error: Option<SyncError>,
}

/// Scripted rclone engine. Once the scripted statuses run out every further
/// status check reports the job as still running.
#[derive(Clone)]
pub struct FakeEngine {
    state: Arc<Mutex<EngineState>>,
}

impl FakeEngine {
    pub fn new(transfers: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(EngineState {
                options: RemoteOptions::without_archive(transfers),
                options_set: Vec::new(),
                statuses: VecDeque::new(),
                status_calls: 0,
                syncs: Vec::new(),
                cancels: Vec::new(),
                next_job_id: 1,
                start_error: None,
                options_error: None,
                status_error: None,
            })),
        }
    }

    pub fn push_statuses(&self, statuses: impl IntoIterator<Item = JobStatus>) {
        self.state.lock().unwrap().statuses.extend(statuses);
    }

    pub fn fail_start(&self, err: SyncError) {
        self.state.lock().unwrap().start_error = Some(err);
    }

    pub fn fail_get_options(&self, err: SyncError) {
        self.state.lock().unwrap().options_error = Some(err);
    }

    pub fn fail_status(&self, err: SyncError) {
        self.state.lock().unwrap().status_error = Some(err);
    }

    pub fn options(&self) -> RemoteOptions {
        self.state.lock().unwrap().options.clone()
    }

    pub fn options_set(&self) -> Vec<RemoteOptions> {
        self.state.lock().unwrap().options_set.clone()
    }

    pub fn status_calls(&self) -> usize {
        self.state.lock().unwrap().status_calls
    }

    pub fn syncs(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().syncs.clone()
    }

    pub fn cancels(&self) -> Vec<SyncJobHandle> {
        self.state.lock().unwrap().cancels.clone()
    }
}

#[async_trait]
impl RemoteControl for FakeEngine {
    async fn get_options(&self) -> Result<RemoteOptions> {
        let state = self.state.lock().unwrap();
        match &state.options_error {
            Some(err) => Err(err.clone()),
            None => Ok(state.options.clone()),
        }
    }

    async fn set_options(&self, options: &RemoteOptions) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.options = options.clone();
        state.options_set.push(options.clone());
        Ok(())
    }

    async fn start_sync(&self, src_fs: &str, dst_fs: &str) -> Result<SyncJobHandle> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = &state.start_error {
            return Err(err.clone());
        }
        state.syncs.push((src_fs.to_string(), dst_fs.to_string()));
        let job_id = state.next_job_id;
        state.next_job_id += 1;
        Ok(SyncJobHandle { job_id })
    }

    async fn get_status(&self, _handle: SyncJobHandle) -> Result<JobStatus> {
        let mut state = self.state.lock().unwrap();
        state.status_calls += 1;
        if let Some(err) = &state.status_error {
            return Err(err.clone());
        }
        Ok(state.statuses.pop_front().unwrap_or_else(running))
    }

    async fn cancel(&self, handle: SyncJobHandle) -> Result<bool> {
        self.state.lock().unwrap().cancels.push(handle);
        Ok(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    List,
    Stop(String),
    Start(String),
}

#[derive(Default)]
struct DockerState {
    running: Vec<String>,
    stopped: Vec<String>,
    unstoppable: Vec<String>,
    calls: Vec<RuntimeCall>,
}

#[derive(Clone, Default)]
pub struct FakeDocker {
    state: Arc<Mutex<DockerState>>,
}

impl FakeDocker {
    pub fn with_running(names: &[&str]) -> Self {
        let docker = Self::default();
        docker.state.lock().unwrap().running = names.iter().map(|s| s.to_string()).collect();
        docker
    }

    pub fn add_stopped(&self, name: &str) {
        self.state.lock().unwrap().stopped.push(name.to_string());
    }

    /// Makes every stop of `name` fail while it keeps running.
    pub fn fail_stop(&self, name: &str) {
        self.state.lock().unwrap().unstoppable.push(name.to_string());
    }

    /// Simulates a container being deleted while the sync runs.
    pub fn remove(&self, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.running.retain(|n| n != name);
        state.stopped.retain(|n| n != name);
    }

    pub fn is_running(&self, name: &str) -> bool {
        self.state.lock().unwrap().running.iter().any(|n| n == name)
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn started(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RuntimeCall::Start(name) => Some(name),
                _ => None,
            })
            .collect()
    }

    pub fn stopped(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RuntimeCall::Stop(name) => Some(name),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ContainerRuntime for FakeDocker {
    async fn running_containers(&self) -> Result<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RuntimeCall::List);
        Ok(state.running.clone())
    }

    async fn stop(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RuntimeCall::Stop(name.to_string()));
        if state.unstoppable.iter().any(|n| n == name) {
            return Err(SyncError::ContainerRuntime(format!("{}: stop timed out", name)));
        }
        state.running.retain(|n| n != name);
        state.stopped.push(name.to_string());
        Ok(())
    }

    async fn start(&self, name: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(RuntimeCall::Start(name.to_string()));
        if let Some(pos) = state.stopped.iter().position(|n| n == name) {
            let name = state.stopped.remove(pos);
            state.running.push(name);
            Ok(())
        } else if state.running.iter().any(|n| n == name) {
            Ok(())
        } else {
            Err(SyncError::ContainerNotFound(name.to_string()))
        }
    }
}
