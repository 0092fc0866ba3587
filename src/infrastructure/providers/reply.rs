use super::{external_error, http_client};
use crate::domain::entities::PeerIdentity;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::reply_transport::ReplyTransport;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Hands replies to the platform bridge, which owns the chat sessions
pub struct WebhookReplyTransport {
    client: Client,
    url: String,
}

impl WebhookReplyTransport {
    pub fn new(url: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            client: http_client(Duration::from_secs(15))?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReplyTransport for WebhookReplyTransport {
    async fn reply(
        &self,
        peer: &PeerIdentity,
        reply_to_message_id: Option<&str>,
        text: &str,
    ) -> DomainResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "peer": peer.to_string(),
                "best_effort": !peer.is_resolved(),
                "reply_to_message_id": reply_to_message_id,
                "text": text,
            }))
            .send()
            .await
            .map_err(|e| external_error("Reply", e))?;

        if !response.status().is_success() {
            return Err(DomainError::External(format!(
                "Reply bridge returned HTTP {}",
                response.status().as_u16()
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoggingReplyTransport;

#[async_trait]
impl ReplyTransport for LoggingReplyTransport {
    async fn reply(
        &self,
        peer: &PeerIdentity,
        reply_to_message_id: Option<&str>,
        text: &str,
    ) -> DomainResult<()> {
        tracing::info!(
            peer = %peer,
            reply_to = reply_to_message_id.unwrap_or("-"),
            "Reply (no bridge configured): {}",
            text
        );
        Ok(())
    }
}
