use crate::application::services::escalation_service::{EscalationOutcome, EscalationService};
use crate::domain::entities::{
    NewTicketAction, StatusUpdate, Ticket, TicketAction, TicketStatus, TicketSummary,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{
    ticket_broadcaster::{BaselineSource, TicketBroadcaster},
    ticket_repository::TicketRepository,
};
use crate::domain::services::state_machine::validate_operator_transition;
use crate::infrastructure::http::middleware::auth::AuthenticatedUser;
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const DEFAULT_LIST_LIMIT: i64 = 20;
pub const MAX_LIST_LIMIT: i64 = 200;

#[derive(Debug, Clone, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub escalation_pending: bool,
    pub actions: Vec<TicketAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddNoteRequest {
    pub content: String,
}

/// Operator-facing ticket operations
#[derive(Clone)]
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    broadcaster: Arc<dyn TicketBroadcaster>,
    escalation: EscalationService,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        broadcaster: Arc<dyn TicketBroadcaster>,
        escalation: EscalationService,
    ) -> Self {
        Self {
            tickets,
            broadcaster,
            escalation,
        }
    }

    pub async fn list_recent(&self, limit: Option<i64>) -> ApiResult<Vec<TicketSummary>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        let tickets = self.tickets.list_recent_tickets(limit).await?;
        Ok(tickets.iter().map(TicketSummary::from).collect())
    }

    pub async fn get_ticket(&self, id: &str) -> ApiResult<TicketDetail> {
        let ticket = self.require_ticket(id).await?;
        let actions = self.tickets.list_actions(id).await?;
        Ok(TicketDetail {
            escalation_pending: ticket.status == TicketStatus::EscalationPending,
            ticket,
            actions,
        })
    }

    /// Operator status change. Moving a ticket into `escalation_pending`
    /// starts an escalation run.
    #[tracing::instrument(skip(self, auth_user))]
    pub async fn update_status(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
        target: TicketStatus,
    ) -> ApiResult<TicketSummary> {
        let ticket = self.require_ticket(id).await?;

        validate_operator_transition(ticket.status, target)
            .map_err(DomainError::from)?;

        if ticket.status == target {
            return Ok(ticket.summary());
        }

        let applied = self
            .tickets
            .transition_status(id, &[ticket.status], &StatusUpdate::new(target))
            .await?;
        if !applied {
            return Err(ApiError::Conflict(format!(
                "Ticket {} changed status concurrently, reload and retry",
                id
            )));
        }

        self.tickets
            .append_action(&NewTicketAction::system_event(
                id,
                format!(
                    "Status changed from {} to {} by {}",
                    ticket.status, target, auth_user.user_id
                ),
            ))
            .await?;

        tracing::info!(
            "Ticket {} moved from {} to {} by {}",
            id,
            ticket.status,
            target,
            auth_user.user_id
        );

        let updated = self.require_ticket(id).await?;
        let summary = updated.summary();
        self.broadcaster.ticket_changed(summary.clone()).await;

        if target == TicketStatus::EscalationPending {
            self.escalation.spawn_escalation(id);
        }

        Ok(summary)
    }

    pub async fn add_note(
        &self,
        auth_user: &AuthenticatedUser,
        id: &str,
        content: &str,
    ) -> ApiResult<TicketAction> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ApiError::BadRequest("Note content is required".to_string()));
        }

        if !self.tickets.touch_ticket(id).await? {
            return Err(ApiError::NotFound(format!("Ticket {} not found", id)));
        }

        let action = self
            .tickets
            .append_action(&NewTicketAction::engineer_note(id, &auth_user.user_id, content))
            .await?;

        if let Some(ticket) = self.tickets.get_ticket(id).await? {
            self.broadcaster.ticket_changed(ticket.summary()).await;
        }

        Ok(action)
    }

    /// Runs an escalation for a ticket already in `escalation_pending` and
    /// waits for it to finish
    #[tracing::instrument(skip(self))]
    pub async fn escalate_now(&self, id: &str) -> ApiResult<EscalationOutcome> {
        let ticket = self.require_ticket(id).await?;
        if ticket.status != TicketStatus::EscalationPending {
            return Err(ApiError::Conflict(format!(
                "Ticket {} is {}, only escalation_pending tickets can be escalated",
                id, ticket.status
            )));
        }

        Ok(self.escalation.escalate(id).await)
    }

    async fn require_ticket(&self, id: &str) -> ApiResult<Ticket> {
        self.tickets
            .get_ticket(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Ticket {} not found", id)))
    }
}

/// Feeds the notification hub's baseline straight from the ticket store
pub struct RecentTickets {
    tickets: Arc<dyn TicketRepository>,
}

impl RecentTickets {
    pub fn new(tickets: Arc<dyn TicketRepository>) -> Self {
        Self { tickets }
    }
}

#[async_trait]
impl BaselineSource for RecentTickets {
    async fn recent_tickets(&self, limit: usize) -> DomainResult<Vec<TicketSummary>> {
        let limit = i64::try_from(limit).unwrap_or(MAX_LIST_LIMIT);
        let tickets = self.tickets.list_recent_tickets(limit).await?;
        Ok(tickets.iter().map(TicketSummary::from).collect())
    }
}
