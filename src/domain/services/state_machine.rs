use crate::domain::entities::TicketStatus;
use crate::domain::errors::DomainError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: TicketStatus, to: TicketStatus },
    #[error("Ticket is closed")]
    TicketClosed,
}

impl From<TransitionError> for DomainError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::TicketClosed => DomainError::Conflict(err.to_string()),
            TransitionError::InvalidTransition { .. } => {
                DomainError::ValidationError(err.to_string())
            }
        }
    }
}

/// Something that happened to a ticket and may move its status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A new inbound message on the ticket's thread
    UserMessage,
    /// The triage engine returned a verdict
    TriageCompleted { escalation: bool },
    /// An engineer page reached the transport
    PageSucceeded,
    /// An operator closed the ticket
    ManualClose,
}

/// Validates if a state transition is allowed
pub fn validate_transition(from: TicketStatus, to: TicketStatus) -> Result<(), TransitionError> {
    use TicketStatus::*;

    match (from, to) {
        // Same state is always valid (no-op)
        (a, b) if a == b => Ok(()),

        (Open, AutoAnswered) | (Open, EscalationPending) | (Open, Closed) => Ok(()),
        (AutoAnswered, Open) | (AutoAnswered, EscalationPending) | (AutoAnswered, Closed) => Ok(()),
        (EscalationPending, Escalated) | (EscalationPending, Closed) => Ok(()),
        (Escalated, Closed) => Ok(()),

        // Reopen; only a new inbound user message drives this one
        (Closed, Open) => Ok(()),

        _ => Err(TransitionError::InvalidTransition { from, to }),
    }
}

/// Status a ticket should move to when `trigger` fires in `current`.
///
/// Returning `current` means "no change". A closed ticket only responds to
/// new user messages and to a repeated close.
pub fn next_status(current: TicketStatus, trigger: Trigger) -> Result<TicketStatus, TransitionError> {
    use TicketStatus::*;

    let target = match (current, trigger) {
        (Closed, Trigger::UserMessage) => Open,
        (status, Trigger::UserMessage) => status,

        (Closed, Trigger::TriageCompleted { .. }) => return Err(TransitionError::TicketClosed),
        (Open | AutoAnswered, Trigger::TriageCompleted { escalation: true }) => EscalationPending,
        (Open | AutoAnswered, Trigger::TriageCompleted { escalation: false }) => AutoAnswered,
        // Already with a human; a follow-up verdict does not downgrade it
        (status @ (EscalationPending | Escalated), Trigger::TriageCompleted { .. }) => status,

        (EscalationPending, Trigger::PageSucceeded) => Escalated,
        (Closed, Trigger::PageSucceeded) => return Err(TransitionError::TicketClosed),
        (from, Trigger::PageSucceeded) => {
            return Err(TransitionError::InvalidTransition {
                from,
                to: Escalated,
            })
        }

        (_, Trigger::ManualClose) => Closed,
    };

    validate_transition(current, target)?;
    Ok(target)
}

/// Validates an operator-requested status change.
///
/// Operators may not reopen a closed ticket or mark one escalated; the first
/// happens on new user messages, the second only through a successful page.
pub fn validate_operator_transition(
    current: TicketStatus,
    target: TicketStatus,
) -> Result<(), TransitionError> {
    if current == TicketStatus::Closed && target != TicketStatus::Closed {
        return Err(TransitionError::TicketClosed);
    }
    if target == TicketStatus::Escalated && current != TicketStatus::Escalated {
        return Err(TransitionError::InvalidTransition {
            from: current,
            to: target,
        });
    }
    validate_transition(current, target)
}
