// ABOUTME: Loads the YAML job file describing what to sync and who to notify
// ABOUTME: Jobs keep their file order, which is also the order they run in

use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::{Result, SyncError};

/// One source directory synced into `destination_remote:destination_folder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub name: String,
    pub source_path: String,
    pub destination_remote: String,
    pub destination_folder: String,
    pub transfers: u32,
    pub containers_to_stop: Vec<String>,
    pub timeout: Option<Duration>,
}

impl JobSpec {
    pub fn destination_fs(&self) -> String {
        format!("{}:{}", self.destination_remote, self.destination_folder)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PushoverConfig {
    pub user_token: String,
    pub app_token: String,
}

/// Remote-to-remote pass run after the job list, e.g. keeping a second cloud
/// account identical to the first.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MirrorConfig {
    pub source_remote: String,
    pub destination_remote: String,
    #[serde(default = "default_mirror_transfers")]
    pub transfers: u32,
}

fn default_mirror_transfers() -> u32 {
    20
}

#[derive(Debug, Clone)]
pub struct JobsConfig {
    pub jobs: Vec<JobSpec>,
    pub pushover: Option<PushoverConfig>,
    pub mirror: Option<MirrorConfig>,
}

#[derive(Debug, Deserialize)]
struct JobsFile {
    jobs: IndexMap<String, JobEntry>,
    #[serde(default)]
    pushover: Option<PushoverConfig>,
    #[serde(default)]
    mirror: Option<MirrorConfig>,
}

#[derive(Debug, Deserialize)]
struct JobEntry {
    source_directory: String,
    destination_remote: String,
    destination_directory: String,
    #[serde(default = "default_transfers")]
    transfers: u32,
    #[serde(default)]
    containers_to_stop: Vec<String>,
    #[serde(default)]
    timeout_seconds: Option<u64>,
}

fn default_transfers() -> u32 {
    1
}

impl JobsConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read job file {}", path.display()))?;
        let config = Self::parse(&contents)
            .with_context(|| format!("Invalid job file {}", path.display()))?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let file: JobsFile = serde_yaml::from_str(contents)
            .map_err(|e| SyncError::Config(format!("Failed to parse YAML: {}", e)))?;

        if file.jobs.is_empty() {
            return Err(SyncError::Config("no jobs defined".to_string()));
        }

        let mut jobs = Vec::with_capacity(file.jobs.len());
        for (name, entry) in file.jobs {
            jobs.push(entry.into_spec(name)?);
        }

        if let Some(mirror) = &file.mirror {
            if mirror.source_remote.is_empty() || mirror.destination_remote.is_empty() {
                return Err(SyncError::Config(
                    "mirror needs both source_remote and destination_remote".to_string(),
                ));
            }
            if mirror.transfers == 0 {
                return Err(SyncError::Config(
                    "mirror transfers must be at least 1".to_string(),
                ));
            }
        }

        Ok(Self {
            jobs,
            pushover: file.pushover,
            mirror: file.mirror,
        })
    }
}

impl JobEntry {
    fn into_spec(self, name: String) -> Result<JobSpec> {
        for (field, value) in [
            ("source_directory", &self.source_directory),
            ("destination_remote", &self.destination_remote),
            ("destination_directory", &self.destination_directory),
        ] {
            if value.trim().is_empty() {
                return Err(SyncError::Config(format!("job '{}': {} is empty", name, field)));
            }
        }
        if self.transfers == 0 {
            return Err(SyncError::Config(format!(
                "job '{}': transfers must be at least 1",
                name
            )));
        }

        Ok(JobSpec {
            name,
            source_path: self.source_directory,
            destination_remote: self.destination_remote,
            destination_folder: self.destination_directory,
            transfers: self.transfers,
            containers_to_stop: self.containers_to_stop,
            timeout: self.timeout_seconds.map(Duration::from_secs),
        })
    }
}
