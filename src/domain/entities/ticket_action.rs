use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    UserMessage,
    LlmAnswer,
    EscalationCall,
    EngineerNote,
    SystemEvent,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::UserMessage => "user_message",
            ActionKind::LlmAnswer => "llm_answer",
            ActionKind::EscalationCall => "escalation_call",
            ActionKind::EngineerNote => "engineer_note",
            ActionKind::SystemEvent => "system_event",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user_message" => Ok(ActionKind::UserMessage),
            "llm_answer" => Ok(ActionKind::LlmAnswer),
            "escalation_call" => Ok(ActionKind::EscalationCall),
            "engineer_note" => Ok(ActionKind::EngineerNote),
            "system_event" => Ok(ActionKind::SystemEvent),
            other => Err(DomainError::ValidationError(format!(
                "Unknown action type '{}'",
                other
            ))),
        }
    }
}

/// How an engineer was paged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationMethod {
    TelegramVoice,
    PhoneCall,
}

impl EscalationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationMethod::TelegramVoice => "telegram_voice",
            EscalationMethod::PhoneCall => "phone_call",
        }
    }
}

impl fmt::Display for EscalationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EscalationMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "telegram_voice" => Ok(EscalationMethod::TelegramVoice),
            "phone_call" => Ok(EscalationMethod::PhoneCall),
            other => Err(DomainError::ValidationError(format!(
                "Unknown escalation method '{}'",
                other
            ))),
        }
    }
}

/// Append-only audit record owned by a ticket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketAction {
    pub id: String,
    pub ticket_id: String,
    pub kind: ActionKind,
    pub actor_external_id: Option<String>,
    pub actor_engineer_id: Option<String>,
    pub content: String,
    pub severity: Option<f64>,
    pub escalation_method: Option<EscalationMethod>,
    pub retry_count: Option<i64>,
    pub success: Option<bool>,
    pub created_at: String,
}

/// Action about to be appended; the store assigns id and creation time
#[derive(Debug, Clone, PartialEq)]
pub struct NewTicketAction {
    pub ticket_id: String,
    pub kind: ActionKind,
    pub actor_external_id: Option<String>,
    pub actor_engineer_id: Option<String>,
    pub content: String,
    pub severity: Option<f64>,
    pub escalation_method: Option<EscalationMethod>,
    pub retry_count: Option<i64>,
    pub success: Option<bool>,
}

impl NewTicketAction {
    fn base(ticket_id: &str, kind: ActionKind, content: String) -> Self {
        Self {
            ticket_id: ticket_id.to_string(),
            kind,
            actor_external_id: None,
            actor_engineer_id: None,
            content,
            severity: None,
            escalation_method: None,
            retry_count: None,
            success: None,
        }
    }

    pub fn user_message(ticket_id: &str, actor_external_id: &str, content: &str) -> Self {
        Self {
            actor_external_id: Some(actor_external_id.to_string()),
            ..Self::base(ticket_id, ActionKind::UserMessage, content.to_string())
        }
    }

    pub fn llm_answer(ticket_id: &str, answer: &str, severity: f64) -> Self {
        Self {
            severity: Some(severity),
            ..Self::base(ticket_id, ActionKind::LlmAnswer, answer.to_string())
        }
    }

    pub fn escalation_call(
        ticket_id: &str,
        engineer_id: &str,
        method: EscalationMethod,
        retry_count: u32,
        success: bool,
    ) -> Self {
        let content = if success {
            "Escalation call placed"
        } else {
            "Escalation call failed"
        };
        Self {
            actor_engineer_id: Some(engineer_id.to_string()),
            escalation_method: Some(method),
            retry_count: Some(i64::from(retry_count)),
            success: Some(success),
            ..Self::base(ticket_id, ActionKind::EscalationCall, content.to_string())
        }
    }

    pub fn engineer_note(ticket_id: &str, author_id: &str, content: &str) -> Self {
        Self {
            actor_external_id: Some(author_id.to_string()),
            ..Self::base(ticket_id, ActionKind::EngineerNote, content.to_string())
        }
    }

    pub fn system_event(ticket_id: &str, content: impl Into<String>) -> Self {
        Self::base(ticket_id, ActionKind::SystemEvent, content.into())
    }
}
