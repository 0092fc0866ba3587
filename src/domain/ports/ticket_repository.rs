use crate::domain::entities::{
    NewTicketAction, Platform, StatusUpdate, Ticket, TicketAction, TicketStatus,
};
use crate::domain::errors::DomainResult;
use async_trait::async_trait;

#[async_trait]
pub trait TicketRepository: Send + Sync {
    /// Returns the ticket for `(platform, thread_id)`, creating it in `open`
    /// when absent. An existing ticket gets its `last_activity_at` refreshed.
    /// The flag is true when a new row was inserted.
    async fn find_or_create_ticket(
        &self,
        platform: Platform,
        thread_id: &str,
        user_external_id: &str,
    ) -> DomainResult<(Ticket, bool)>;

    /// Refreshes `last_activity_at`; returns false when the ticket is missing
    async fn touch_ticket(&self, id: &str) -> DomainResult<bool>;

    async fn get_ticket(&self, id: &str) -> DomainResult<Option<Ticket>>;

    async fn get_ticket_status(&self, id: &str) -> DomainResult<Option<TicketStatus>>;

    /// Compare-and-set status write. Applies `update` only while the stored
    /// status is one of `expected`; returns whether a row changed.
    async fn transition_status(
        &self,
        id: &str,
        expected: &[TicketStatus],
        update: &StatusUpdate,
    ) -> DomainResult<bool>;

    async fn append_action(&self, action: &NewTicketAction) -> DomainResult<TicketAction>;

    /// Actions in creation order
    async fn list_actions(&self, ticket_id: &str) -> DomainResult<Vec<TicketAction>>;

    /// Most recently active tickets first
    async fn list_recent_tickets(&self, limit: i64) -> DomainResult<Vec<Ticket>>;
}
