use crate::domain::entities::TicketSummary;
use crate::domain::errors::DomainResult;
use async_trait::async_trait;

/// Receives every ticket state change so live clients can be updated
#[async_trait]
pub trait TicketBroadcaster: Send + Sync {
    async fn ticket_changed(&self, summary: TicketSummary);
}

/// Source of the snapshot a client receives right after authenticating
#[async_trait]
pub trait BaselineSource: Send + Sync {
    async fn recent_tickets(&self, limit: usize) -> DomainResult<Vec<TicketSummary>>;
}
