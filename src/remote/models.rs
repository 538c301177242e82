// ABOUTME: Data structures exchanged with the rclone remote control API
// ABOUTME: Field names follow rclone's own JSON (PascalCase options, srcFs/dstFs)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The subset of rclone's global `main` options this tool checks out per job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteOptions {
    #[serde(rename = "BackupDir", default)]
    pub backup_dir: String,
    #[serde(rename = "Transfers")]
    pub transfers: u32,
}

impl RemoteOptions {
    /// Options for a job writing into `remote:folder`. Files replaced or
    /// deleted by the sync are moved to a dated folder under `archive/`.
    pub fn for_job(remote: &str, folder: &str, transfers: u32, date: NaiveDate) -> Self {
        Self {
            backup_dir: format!(
                "{remote}:archive/{folder}/{folder}_{}",
                date.format("%d_%m_%Y")
            ),
            transfers,
        }
    }

    /// Options with no archive directory, used for remote-to-remote mirroring.
    pub fn without_archive(transfers: u32) -> Self {
        Self {
            backup_dir: String::new(),
            transfers,
        }
    }
}

/// Body of `options/get` responses and `options/set` requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsBlock {
    pub main: RemoteOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncRequest<'a> {
    #[serde(rename = "srcFs")]
    pub src_fs: &'a str,
    #[serde(rename = "dstFs")]
    pub dst_fs: &'a str,
    #[serde(rename = "_async")]
    pub run_async: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncResponse {
    pub jobid: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobIdRequest {
    pub jobid: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncJobHandle {
    pub job_id: u64,
}

impl fmt::Display for SyncJobHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.job_id)
    }
}

/// Response of `job/status`. `finished` is required so that a truncated or
/// unrelated body is reported instead of being read as "still running".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobStatus {
    pub finished: bool,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub error: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StopResponse {
    #[serde(default)]
    pub finished: bool,
}

/// Error body rclone returns alongside a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct RcErrorBody {
    pub error: String,
}
