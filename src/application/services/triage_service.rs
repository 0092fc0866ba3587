use crate::application::services::escalation_service::EscalationService;
use crate::domain::entities::{NewTicketAction, StatusUpdate, ThreadKey, Ticket, TicketStatus};
use crate::domain::errors::DomainResult;
use crate::domain::ports::{
    reply_transport::ReplyTransport, ticket_broadcaster::TicketBroadcaster,
    ticket_repository::TicketRepository, triage_engine::TriageEngine,
};
use crate::domain::services::state_machine::{next_status, TransitionError, Trigger};
use std::sync::Arc;

/// What applying a verdict did to the ticket
#[derive(Debug, Clone, PartialEq)]
pub enum TriageOutcome {
    Applied {
        from: TicketStatus,
        to: TicketStatus,
        escalating: bool,
    },
    /// Ticket was closed (or vanished) by the time the verdict arrived
    Skipped,
    /// Status moved between the re-read and the write
    RaceLost,
    Failed(String),
}

/// Consumes triage verdicts: records the answer, moves the ticket, replies to
/// the user and hands escalations to the scheduler.
#[derive(Clone)]
pub struct TriageService {
    engine: Arc<dyn TriageEngine>,
    tickets: Arc<dyn TicketRepository>,
    replies: Arc<dyn ReplyTransport>,
    broadcaster: Arc<dyn TicketBroadcaster>,
    escalation: EscalationService,
}

impl TriageService {
    pub fn new(
        engine: Arc<dyn TriageEngine>,
        tickets: Arc<dyn TicketRepository>,
        replies: Arc<dyn ReplyTransport>,
        broadcaster: Arc<dyn TicketBroadcaster>,
        escalation: EscalationService,
    ) -> Self {
        Self {
            engine,
            tickets,
            replies,
            broadcaster,
            escalation,
        }
    }

    /// Triage `text` for a ticket. Never returns an error; failures are
    /// logged and reported in the outcome.
    #[tracing::instrument(skip(self, text))]
    pub async fn process(&self, ticket_id: &str, text: &str) -> TriageOutcome {
        match self.try_process(ticket_id, text).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Triage failed for ticket {}: {}", ticket_id, e);
                TriageOutcome::Failed(e.to_string())
            }
        }
    }

    async fn try_process(&self, ticket_id: &str, text: &str) -> DomainResult<TriageOutcome> {
        let verdict = self.engine.triage(text).await?.normalized();

        // Re-read right before acting; the verdict may be stale
        let Some(ticket) = self.tickets.get_ticket(ticket_id).await? else {
            tracing::warn!("Ticket {} disappeared before triage completed", ticket_id);
            return Ok(TriageOutcome::Skipped);
        };

        let trigger = Trigger::TriageCompleted {
            escalation: verdict.escalation,
        };
        let target = match next_status(ticket.status, trigger) {
            Ok(target) => target,
            Err(TransitionError::TicketClosed) => {
                tracing::info!("Ticket {} closed, discarding late triage result", ticket_id);
                return Ok(TriageOutcome::Skipped);
            }
            Err(e) => return Err(e.into()),
        };

        let update = StatusUpdate::new(target).with_severity(verdict.severity);
        let applied = self
            .tickets
            .transition_status(ticket_id, &[ticket.status], &update)
            .await?;
        if !applied {
            tracing::info!(
                "Ticket {} changed status during triage, skipping verdict",
                ticket_id
            );
            return Ok(TriageOutcome::RaceLost);
        }

        self.tickets
            .append_action(&NewTicketAction::llm_answer(
                ticket_id,
                &verdict.answer,
                verdict.severity,
            ))
            .await?;

        tracing::info!(
            ticket_id,
            severity = verdict.severity,
            escalation = verdict.escalation,
            from = %ticket.status,
            to = %target,
            "Triage verdict applied"
        );

        if !verdict.answer.trim().is_empty() {
            self.send_reply(&ticket, &verdict.answer).await;
        }

        if let Some(updated) = self.tickets.get_ticket(ticket_id).await? {
            self.broadcaster.ticket_changed(updated.summary()).await;
        }

        let escalating =
            target == TicketStatus::EscalationPending && ticket.status != target;
        if escalating {
            self.escalation.spawn_escalation(ticket_id);
        }

        Ok(TriageOutcome::Applied {
            from: ticket.status,
            to: target,
            escalating,
        })
    }

    async fn send_reply(&self, ticket: &Ticket, answer: &str) {
        let Some(thread) = ThreadKey::parse(&ticket.thread_id) else {
            tracing::warn!(
                "Ticket {} has an unparseable thread id '{}', reply skipped",
                ticket.id,
                ticket.thread_id
            );
            return;
        };

        if !thread.peer.is_resolved() {
            tracing::warn!(
                "Replying to ticket {} through best-effort peer '{}'",
                ticket.id,
                thread.peer
            );
        }

        if let Err(e) = self
            .replies
            .reply(&thread.peer, Some(&thread.root_message_id), answer)
            .await
        {
            tracing::error!("Failed to send auto-reply for ticket {}: {}", ticket.id, e);
        }
    }
}
