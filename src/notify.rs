// ABOUTME: Delivers the run summary as a push notification
// ABOUTME: Delivery problems are logged and never change recorded job results

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::PushoverConfig;

pub const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, message: &str) -> Result<()>;
}

pub struct PushoverNotifier {
    client: Client,
    url: String,
    user_token: String,
    app_token: String,
}

impl PushoverNotifier {
    pub fn new(config: &PushoverConfig) -> Result<Self> {
        Self::with_url(config, PUSHOVER_URL.to_string())
    }

    pub fn with_url(config: &PushoverConfig, url: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url,
            user_token: config.user_token.clone(),
            app_token: config.app_token.clone(),
        })
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, title: &str, message: &str) -> Result<()> {
        let form = [
            ("user", self.user_token.as_str()),
            ("token", self.app_token.as_str()),
            ("title", title),
            ("message", message),
        ];

        let response = self
            .client
            .post(&self.url)
            .form(&form)
            .send()
            .await
            .with_context(|| format!("Failed to send notification to {}", self.url))?;

        info!(
            "Received response code: {} from {}",
            response.status().as_u16(),
            self.url
        );
        Ok(())
    }
}

/// Used when no push channel is configured; the summary only goes to the log.
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, _message: &str) -> Result<()> {
        info!("No notification channel configured, {} summary only logged", title);
        Ok(())
    }
}

/// Sends the summary, logging instead of failing when delivery breaks.
pub async fn deliver(notifier: &dyn Notifier, title: &str, message: &str) {
    if let Err(e) = notifier.notify(title, message).await {
        warn!("Notification delivery failed: {:#}", e);
    }
}
