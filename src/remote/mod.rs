// ABOUTME: rclone remote control module
// ABOUTME: Client for the rc API and the JSON models it exchanges

pub mod client;
pub mod models;

pub use client::{RcClient, RcCredentials, RemoteControl};
pub use models::{JobStatus, RemoteOptions, SyncJobHandle};
