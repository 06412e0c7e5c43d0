//! Follow-up messages
//!
//! Messages sent after the initial interaction response (announcement
//! deliveries) go through [`FollowupSender`]. The webhook implementation
//! posts to the platform's interaction webhook.

use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::commands::Reply;
use crate::types::{CofferError, Result};

/// Addresses the follow-up webhook of one interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowupTarget {
    pub application_id: String,
    pub token: String,
}

#[async_trait]
pub trait FollowupSender: Send + Sync {
    async fn send(&self, target: &FollowupTarget, reply: &Reply) -> Result<()>;
}

/// Posts follow-ups to `{api_base}/webhooks/{application_id}/{token}`
pub struct WebhookFollowups {
    http_client: reqwest::Client,
    api_base: String,
}

impl WebhookFollowups {
    pub fn new(api_base: &str) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent(concat!("coffer/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn url_for(&self, target: &FollowupTarget) -> String {
        format!(
            "{}/webhooks/{}/{}",
            self.api_base, target.application_id, target.token
        )
    }
}

#[async_trait]
impl FollowupSender for WebhookFollowups {
    async fn send(&self, target: &FollowupTarget, reply: &Reply) -> Result<()> {
        let response = self
            .http_client
            .post(self.url_for(target))
            .json(&reply.to_message_data())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CofferError::Http(format!(
                "follow-up rejected with {}: {}",
                status, body
            )));
        }

        debug!(application_id = %target.application_id, "Follow-up sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_url() {
        let sender = WebhookFollowups::new("https://discord.com/api/v10/");
        let target = FollowupTarget {
            application_id: "123".into(),
            token: "tok".into(),
        };
        assert_eq!(
            sender.url_for(&target),
            "https://discord.com/api/v10/webhooks/123/tok"
        );
    }
}
