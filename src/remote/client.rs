// ABOUTME: HTTP client for rclone's remote control (rc) API
// ABOUTME: Handles option snapshots, async sync submission, status polling and job cancellation

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;

use super::models::{
    JobIdRequest, JobStatus, OptionsBlock, RcErrorBody, RemoteOptions, StopResponse,
    SyncJobHandle, SyncRequest, SyncResponse,
};
use crate::error::{Result, SyncError};

/// Commands this tool issues against the sync engine. No call retries;
/// the runner decides what a failure means for the job.
#[async_trait]
pub trait RemoteControl: Send + Sync {
    async fn get_options(&self) -> Result<RemoteOptions>;

    async fn set_options(&self, options: &RemoteOptions) -> Result<()>;

    async fn start_sync(&self, src_fs: &str, dst_fs: &str) -> Result<SyncJobHandle>;

    async fn get_status(&self, handle: SyncJobHandle) -> Result<JobStatus>;

    /// Returns whether rclone reported the job as finished after the stop.
    async fn cancel(&self, handle: SyncJobHandle) -> Result<bool>;
}

#[derive(Debug, Clone)]
pub struct RcCredentials {
    pub user: String,
    pub password: String,
}

pub struct RcClient {
    client: Client,
    api_base_url: String,
    credentials: Option<RcCredentials>,
}

enum CallError {
    Unreachable(String),
    Rejected(String),
    Malformed(String),
}

impl CallError {
    fn into_message(self) -> String {
        match self {
            CallError::Unreachable(msg) | CallError::Rejected(msg) | CallError::Malformed(msg) => {
                msg
            }
        }
    }
}

impl From<CallError> for SyncError {
    fn from(err: CallError) -> Self {
        SyncError::ControlUnavailable(err.into_message())
    }
}

impl RcClient {
    pub fn new(api_base_url: String, credentials: Option<RcCredentials>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    async fn call<B, R>(&self, command: &str, body: &B) -> std::result::Result<R, CallError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.api_base_url, command);
        debug!(
            "rc {} {}",
            command,
            serde_json::to_string(body).unwrap_or_default()
        );

        let mut request = self.client.post(&url).json(body);
        if let Some(credentials) = &self.credentials {
            request = request.basic_auth(&credentials.user, Some(&credentials.password));
        }

        let response = request.send().await.map_err(|e| {
            CallError::Unreachable(format!("{} request to {} failed: {}", command, url, e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let reason = serde_json::from_str::<RcErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(CallError::Rejected(format!(
                "{} failed with status {}: {}",
                command, status, reason
            )));
        }

        response
            .json::<R>()
            .await
            .map_err(|e| CallError::Malformed(format!("Failed to parse {} response: {}", command, e)))
    }
}

#[async_trait]
impl RemoteControl for RcClient {
    async fn get_options(&self) -> Result<RemoteOptions> {
        let block: OptionsBlock = self.call("options/get", &serde_json::json!({})).await?;
        Ok(block.main)
    }

    async fn set_options(&self, options: &RemoteOptions) -> Result<()> {
        let body = OptionsBlock {
            main: options.clone(),
        };
        let _: serde_json::Value = self.call("options/set", &body).await?;
        Ok(())
    }

    async fn start_sync(&self, src_fs: &str, dst_fs: &str) -> Result<SyncJobHandle> {
        let request = SyncRequest {
            src_fs,
            dst_fs,
            run_async: true,
        };
        let response: SyncResponse = self.call("sync/sync", &request).await.map_err(|e| match e {
            CallError::Unreachable(msg) => SyncError::ControlUnavailable(msg),
            other => SyncError::SyncStartFailed(other.into_message()),
        })?;

        match response.jobid {
            Some(job_id) => Ok(SyncJobHandle { job_id }),
            None => Err(SyncError::SyncStartFailed(format!(
                "sync/sync for {} -> {} returned no jobid",
                src_fs, dst_fs
            ))),
        }
    }

    async fn get_status(&self, handle: SyncJobHandle) -> Result<JobStatus> {
        let request = JobIdRequest {
            jobid: handle.job_id,
        };
        Ok(self.call("job/status", &request).await?)
    }

    async fn cancel(&self, handle: SyncJobHandle) -> Result<bool> {
        let request = JobIdRequest {
            jobid: handle.job_id,
        };
        let response: StopResponse = self.call("job/stop", &request).await?;
        Ok(response.finished)
    }
}
