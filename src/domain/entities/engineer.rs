use super::ticket_action::EscalationMethod;
use serde::{Deserialize, Serialize};

/// An engineer who can be paged.
///
/// `active` (currently the primary responder) and `on_call` (eligible for
/// paging) are independent flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engineer {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub telegram_id: Option<String>,
    pub phone_number: Option<String>,
    pub active: bool,
    pub on_call: bool,
}

impl Engineer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            email: None,
            telegram_id: None,
            phone_number: None,
            active: false,
            on_call: false,
        }
    }

    /// Voice calls over the chat platform are preferred when a handle exists
    pub fn escalation_method(&self) -> EscalationMethod {
        if self.telegram_id.is_some() {
            EscalationMethod::TelegramVoice
        } else {
            EscalationMethod::PhoneCall
        }
    }

    /// Contact handle for the given method, if the engineer has one
    pub fn contact_for(&self, method: EscalationMethod) -> Option<&str> {
        match method {
            EscalationMethod::TelegramVoice => self.telegram_id.as_deref(),
            EscalationMethod::PhoneCall => self.phone_number.as_deref(),
        }
    }
}

/// Orders engineers for paging: active responders first, then on-call
/// backups. Engineers that are neither are dropped. Relative order within each
/// group is preserved.
pub fn escalation_candidates(engineers: Vec<Engineer>) -> Vec<Engineer> {
    let (active, rest): (Vec<_>, Vec<_>) = engineers.into_iter().partition(|e| e.active);
    active
        .into_iter()
        .chain(rest.into_iter().filter(|e| e.on_call))
        .collect()
}
