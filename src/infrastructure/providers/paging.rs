use super::{external_error, http_client};
use crate::domain::entities::{Engineer, EscalationMethod};
use crate::domain::errors::DomainResult;
use crate::domain::ports::paging_transport::PagingTransport;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Places pages through an HTTP gateway (voice bot or telephony provider).
///
/// A 2xx answer counts as delivered; it says nothing about whether the
/// engineer picked up.
pub struct WebhookPagingTransport {
    client: Client,
    url: String,
}

impl WebhookPagingTransport {
    pub fn new(url: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            client: http_client(Duration::from_secs(30))?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl PagingTransport for WebhookPagingTransport {
    async fn page(&self, engineer: &Engineer, method: EscalationMethod) -> DomainResult<bool> {
        let Some(contact) = engineer.contact_for(method) else {
            tracing::warn!(
                "Engineer {} has no contact for {}, page skipped",
                engineer.id,
                method
            );
            return Ok(false);
        };

        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "engineer_id": engineer.id,
                "name": engineer.name,
                "method": method,
                "contact": contact,
            }))
            .send()
            .await
            .map_err(|e| external_error("Paging", e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                "Paging gateway returned HTTP {} for engineer {}",
                status.as_u16(),
                engineer.id
            );
        }
        Ok(status.is_success())
    }
}

/// Used when no paging gateway is configured: every attempt fails loudly so
/// the audit trail shows the gap
#[derive(Debug, Clone, Default)]
pub struct LoggingPagingTransport;

#[async_trait]
impl PagingTransport for LoggingPagingTransport {
    async fn page(&self, engineer: &Engineer, method: EscalationMethod) -> DomainResult<bool> {
        tracing::warn!(
            "No paging gateway configured, cannot reach engineer {} via {}",
            engineer.name,
            method
        );
        Ok(false)
    }
}
