use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;

use crate::ports::NotificationPort;

/// Delivers match notifications to an external push gateway over HTTP.
#[derive(Debug, Clone)]
pub struct PushGatewayNotifier {
    client: Client,
    base_url: String,
}

impl PushGatewayNotifier {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }
}

#[async_trait]
impl NotificationPort for PushGatewayNotifier {
    async fn send_match(&self, user_a: &str, user_b: &str) -> Result<()> {
        let payload = serde_json::json!({
            "type": "MATCH_PROPOSAL",
            "users": [user_a, user_b],
        });

        let response = self
            .client
            .post(format!("{}/notifications", self.base_url))
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!("push gateway returned {}", response.status()));
        }

        tracing::debug!(user_a, user_b, "match notification delivered");
        Ok(())
    }
}

/// Stand-in notifier for deployments without a push gateway configured.
#[derive(Debug, Clone, Default)]
pub struct LogOnlyNotifier;

#[async_trait]
impl NotificationPort for LogOnlyNotifier {
    async fn send_match(&self, user_a: &str, user_b: &str) -> Result<()> {
        tracing::info!(user_a, user_b, "match notification (no push gateway configured)");
        Ok(())
    }
}
