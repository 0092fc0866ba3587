use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    AutoAnswered,
    EscalationPending,
    Escalated,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::AutoAnswered => "auto_answered",
            TicketStatus::EscalationPending => "escalation_pending",
            TicketStatus::Escalated => "escalated",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, TicketStatus::Closed)
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TicketStatus::Open),
            "auto_answered" => Ok(TicketStatus::AutoAnswered),
            "escalation_pending" => Ok(TicketStatus::EscalationPending),
            "escalated" => Ok(TicketStatus::Escalated),
            "closed" => Ok(TicketStatus::Closed),
            other => Err(DomainError::ValidationError(format!(
                "Unknown ticket status '{}'",
                other
            ))),
        }
    }
}

/// Chat platform a ticket was raised on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Telegram,
    Slack,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Telegram => "telegram",
            Platform::Slack => "slack",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "telegram" => Ok(Platform::Telegram),
            "slack" => Ok(Platform::Slack),
            other => Err(DomainError::ValidationError(format!(
                "Unknown platform '{}'",
                other
            ))),
        }
    }
}

/// A support ticket bound to one chat thread.
///
/// `(platform, thread_id)` is unique: follow-up messages on the same thread
/// refresh the existing row instead of creating a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub platform: Platform,
    pub thread_id: String,
    pub status: TicketStatus,
    pub user_external_id: String,
    pub current_engineer_id: Option<String>,
    pub severity: Option<f64>,
    pub last_activity_at: String,
    pub received_at: String,
}

impl Ticket {
    pub fn summary(&self) -> TicketSummary {
        TicketSummary::from(self)
    }
}

/// Dashboard-facing snapshot of a ticket, pushed over the notification hub
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketSummary {
    pub id: String,
    pub status: TicketStatus,
    pub platform: Platform,
    pub thread_id: String,
    pub severity: Option<f64>,
    pub escalation_pending: bool,
    pub current_engineer_id: Option<String>,
    pub last_activity_at: String,
    pub received_at: String,
}

impl From<&Ticket> for TicketSummary {
    fn from(ticket: &Ticket) -> Self {
        Self {
            id: ticket.id.clone(),
            status: ticket.status,
            platform: ticket.platform,
            thread_id: ticket.thread_id.clone(),
            severity: ticket.severity,
            escalation_pending: ticket.status == TicketStatus::EscalationPending,
            current_engineer_id: ticket.current_engineer_id.clone(),
            last_activity_at: ticket.last_activity_at.clone(),
            received_at: ticket.received_at.clone(),
        }
    }
}

/// Fields written together with a status change.
///
/// `None` leaves the stored value untouched.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: TicketStatus,
    pub current_engineer_id: Option<String>,
    pub severity: Option<f64>,
    pub last_activity_at: String,
}

impl StatusUpdate {
    pub fn new(status: TicketStatus) -> Self {
        Self {
            status,
            current_engineer_id: None,
            severity: None,
            last_activity_at: super::timestamp_now(),
        }
    }

    pub fn with_engineer(mut self, engineer_id: impl Into<String>) -> Self {
        self.current_engineer_id = Some(engineer_id.into());
        self
    }

    pub fn with_severity(mut self, severity: f64) -> Self {
        self.severity = Some(severity);
        self
    }
}
