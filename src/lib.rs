// ABOUTME: Library root for the rclone backup runner
// ABOUTME: Exposes job configuration, engine and container control, and the run driver

pub mod config;
pub mod containers;
pub mod cutoff;
pub mod error;
pub mod logging;
pub mod notify;
pub mod orchestrator;
pub mod remote;
pub mod report;
pub mod runner;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{JobSpec, JobsConfig};
pub use error::{Result, SyncError};
pub use orchestrator::{Orchestrator, RunSettings};
pub use runner::{JobOutcome, JobRunner, SyncPlan};
