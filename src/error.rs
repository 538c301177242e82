// ABOUTME: Error types for engine control, container lifecycle and configuration
// ABOUTME: Expected job outcomes (timeout, failed sync) are data, not errors

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// rclone rc could not be reached or answered with something unreadable.
    ControlUnavailable(String),
    /// rclone refused `sync/sync` or did not hand back a job id.
    SyncStartFailed(String),
    /// A container we need to start does not exist on the Docker host.
    ContainerNotFound(String),
    ContainerRuntime(String),
    Config(String),
}

impl SyncError {
    /// Errors that may leave a service offline. These abort the run instead of
    /// being folded into a job result.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::ContainerNotFound(_))
    }
}

impl fmt::Display for SyncError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SyncError::ControlUnavailable(msg) => {
                write!(f, "rclone remote control unavailable: {}", msg)
            }
            SyncError::SyncStartFailed(msg) => write!(f, "Failed to start sync: {}", msg),
            SyncError::ContainerNotFound(name) => write!(
                f,
                "Container '{}' not found, it could not be restarted and is still offline",
                name
            ),
            SyncError::ContainerRuntime(msg) => write!(f, "Container runtime error: {}", msg),
            SyncError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for SyncError {}

pub type Result<T> = std::result::Result<T, SyncError>;
