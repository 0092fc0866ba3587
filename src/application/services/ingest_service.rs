use crate::application::services::thread_resolver::ThreadResolver;
use crate::application::services::triage_service::TriageService;
use crate::domain::entities::{InboundMessage, NewTicketAction, Platform, StatusUpdate};
use crate::domain::errors::DomainResult;
use crate::domain::ports::{
    task_spawner::TaskSpawner, ticket_broadcaster::TicketBroadcaster,
    ticket_repository::TicketRepository,
};
use crate::domain::services::state_machine::{next_status, Trigger};
use crate::infrastructure::observability::INBOUND_MESSAGES;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReceipt {
    pub ticket_id: String,
    pub thread_id: String,
    /// A new ticket row was created for this thread
    pub created: bool,
    /// The message reopened a closed ticket
    pub reopened: bool,
}

/// Chats the desk takes tickets from.
///
/// Entries are either a bare chat id or `platform:chat_id`. An empty list
/// accepts every chat.
#[derive(Debug, Clone, Default)]
pub struct SourceAllowList {
    entries: HashSet<String>,
}

impl SourceAllowList {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(Into::into)
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn allows(&self, platform: Platform, chat_id: &str) -> bool {
        self.entries.is_empty()
            || self.entries.contains(chat_id)
            || self
                .entries
                .contains(&format!("{}:{}", platform.as_str(), chat_id))
    }
}

/// Entry point for inbound chat messages.
///
/// Resolves the thread, finds or creates its ticket, records the message and
/// schedules triage in the background.
#[derive(Clone)]
pub struct IngestService {
    resolver: Arc<ThreadResolver>,
    tickets: Arc<dyn TicketRepository>,
    broadcaster: Arc<dyn TicketBroadcaster>,
    triage: TriageService,
    spawner: Arc<dyn TaskSpawner>,
    sources: SourceAllowList,
}

impl IngestService {
    pub fn new(
        resolver: Arc<ThreadResolver>,
        tickets: Arc<dyn TicketRepository>,
        broadcaster: Arc<dyn TicketBroadcaster>,
        triage: TriageService,
        spawner: Arc<dyn TaskSpawner>,
        sources: SourceAllowList,
    ) -> Self {
        Self {
            resolver,
            tickets,
            broadcaster,
            triage,
            spawner,
            sources,
        }
    }

    /// Never fails; errors are logged and the message is dropped
    pub async fn handle_inbound(&self, message: InboundMessage) -> Option<IngestReceipt> {
        match self.ingest(message).await {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::error!("Failed to ingest inbound message: {}", e);
                None
            }
        }
    }

    /// Returns `None` for messages without text or from chats outside the
    /// allow-list
    #[tracing::instrument(skip(self, message), fields(platform = %message.platform, message_id = %message.message_id))]
    pub async fn ingest(&self, message: InboundMessage) -> DomainResult<Option<IngestReceipt>> {
        if message.text.trim().is_empty() {
            tracing::debug!("Ignoring inbound message without text");
            return Ok(None);
        }

        if !self.sources.allows(message.platform, &message.chat_id) {
            tracing::debug!(
                "Ignoring message from {} chat {} outside the allow-list",
                message.platform,
                message.chat_id
            );
            return Ok(None);
        }

        metrics::counter!(
            INBOUND_MESSAGES,
            "platform" => message.platform.as_str()
        )
        .increment(1);

        let resolved = self.resolver.resolve(&message).await;
        if resolved.is_degraded() {
            tracing::warn!(
                "Peer for chat {} could not be resolved, thread id is best-effort",
                message.chat_id
            );
        }
        let thread_id = resolved.thread_id();

        let (ticket, created) = self
            .tickets
            .find_or_create_ticket(message.platform, &thread_id, message.sender())
            .await?;

        let reopened = match next_status(ticket.status, Trigger::UserMessage)? {
            target if target != ticket.status => {
                let applied = self
                    .tickets
                    .transition_status(&ticket.id, &[ticket.status], &StatusUpdate::new(target))
                    .await?;
                if applied {
                    tracing::info!("Ticket {} reopened by a new user message", ticket.id);
                }
                applied
            }
            _ => false,
        };

        self.tickets
            .append_action(&NewTicketAction::user_message(
                &ticket.id,
                message.sender(),
                &message.text,
            ))
            .await?;

        if reopened {
            self.tickets
                .append_action(&NewTicketAction::system_event(
                    &ticket.id,
                    "Ticket reopened by user message",
                ))
                .await?;
        }

        if let Some(current) = self.tickets.get_ticket(&ticket.id).await? {
            self.broadcaster.ticket_changed(current.summary()).await;
        }

        tracing::info!(
            ticket_id = %ticket.id,
            thread_id = %thread_id,
            created,
            reopened,
            "Inbound message recorded"
        );

        self.spawn_triage(&ticket.id, &message.text);

        Ok(Some(IngestReceipt {
            ticket_id: ticket.id,
            thread_id,
            created,
            reopened,
        }))
    }

    fn spawn_triage(&self, ticket_id: &str, text: &str) {
        let triage = self.triage.clone();
        let ticket_id = ticket_id.to_string();
        let text = text.to_string();
        self.spawner.spawn(Box::pin(async move {
            let outcome = triage.process(&ticket_id, &text).await;
            tracing::debug!("Triage for ticket {} finished: {:?}", ticket_id, outcome);
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allow_list_matches_bare_and_qualified_ids() {
        let sources = SourceAllowList::new(["-100777", "slack:C1", " "]);

        assert!(sources.allows(Platform::Telegram, "-100777"));
        assert!(sources.allows(Platform::Slack, "-100777"));
        assert!(sources.allows(Platform::Slack, "C1"));
        assert!(!sources.allows(Platform::Telegram, "C1"));
        assert!(!sources.allows(Platform::Slack, "C2"));
    }

    #[test]
    fn test_empty_allow_list_accepts_everything() {
        assert!(SourceAllowList::default().allows(Platform::Slack, "anything"));
    }
}
