use crate::domain::entities::{Engineer, EscalationMethod};
use crate::domain::errors::DomainResult;
use async_trait::async_trait;

/// Fire-and-forget paging.
///
/// `Ok(true)` means the attempt reached the transport, not that a human
/// answered. Errors are treated as a failed attempt by callers.
#[async_trait]
pub trait PagingTransport: Send + Sync {
    async fn page(&self, engineer: &Engineer, method: EscalationMethod) -> DomainResult<bool>;
}
