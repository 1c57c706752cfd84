//! Trade notifications
//!
//! Fire-and-forget: the runner logs a failed notification and moves
//! on, it never blocks or aborts a cycle.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

const PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> anyhow::Result<()>;
}

/// Pushover push notifications
pub struct PushoverNotifier {
    client: Client,
    url: String,
    token: String,
    user: String,
}

impl PushoverNotifier {
    pub fn new(token: impl Into<String>, user: impl Into<String>) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            client,
            url: PUSHOVER_URL.to_string(),
            token: token.into(),
            user: user.into(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl Notifier for PushoverNotifier {
    async fn notify(&self, message: &str) -> anyhow::Result<()> {
        let params = [
            ("token", self.token.as_str()),
            ("user", self.user.as_str()),
            ("message", message),
        ];
        self.client
            .post(&self.url)
            .form(&params)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
