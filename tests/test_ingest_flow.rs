mod helpers;

use async_trait::async_trait;
use helpers::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use triagedesk::application::services::{
    EscalationConfig, EscalationService, SourceAllowList, TriageOutcome, TriageService,
};
use triagedesk::bootstrap::Settings;
use triagedesk::domain::entities::{
    ActionKind, NewTicketAction, PeerIdentity, PeerKey, Platform, StatusUpdate, Ticket,
    TicketAction, TicketStatus,
};
use triagedesk::domain::errors::DomainResult;
use triagedesk::domain::ports::ticket_repository::TicketRepository;
use triagedesk::domain::ports::triage_engine::{TriageEngine, TriageVerdict};
use triagedesk::infrastructure::persistence::Database;
use triagedesk::infrastructure::http::middleware::AuthenticatedUser;

fn operator() -> AuthenticatedUser {
    AuthenticatedUser {
        user_id: OPERATOR_ID.to_string(),
    }
}

#[tokio::test]
async fn test_message_is_triaged_and_answered() {
    let app = TestApp::new(FixedTriage::answer("Try clearing the cache")).await;

    let ticket_id = app
        .deliver(slack_message("C1", "100", "the dashboard will not load"))
        .await
        .expect("message should be ingested");

    let ticket = app.db.get_ticket(&ticket_id).await.unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::AutoAnswered);
    assert_eq!(ticket.thread_id, "chat:C1:100");
    assert_eq!(ticket.user_external_id, "U123");
    assert_eq!(ticket.severity, Some(0.1));

    let kinds: Vec<_> = app
        .db
        .list_actions(&ticket_id)
        .await
        .unwrap()
        .iter()
        .map(|a| a.kind)
        .collect();
    assert_eq!(kinds, vec![ActionKind::UserMessage, ActionKind::LlmAnswer]);

    let sent = app.replies.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].peer,
        PeerIdentity::Resolved(PeerKey::Chat {
            id: "C1".to_string()
        })
    );
    assert_eq!(sent[0].reply_to.as_deref(), Some("100"));
    assert_eq!(sent[0].text, "Try clearing the cache");

    assert!(app.pager.calls().is_empty());
}

#[tokio::test]
async fn test_empty_message_is_ignored() {
    let app = TestApp::new(FixedTriage::answer("unused")).await;

    let receipt = app
        .state
        .ingest_service
        .handle_inbound(slack_message("C1", "100", "   "))
        .await;
    assert!(receipt.is_none());
    assert!(app.db.list_recent_tickets(10).await.unwrap().is_empty());
    assert!(app.replies.sent().is_empty());
}

#[tokio::test]
async fn test_follow_up_joins_open_thread() {
    let app = TestApp::new(FixedTriage::answer("Noted")).await;

    let first = app.deliver(slack_message("C1", "100", "login fails")).await.unwrap();
    let second = app
        .deliver(slack_message("C1", "101", "still failing"))
        .await
        .unwrap();
    assert_eq!(first, second);

    let actions = app.db.list_actions(&first).await.unwrap();
    let user_messages = actions
        .iter()
        .filter(|a| a.kind == ActionKind::UserMessage)
        .count();
    assert_eq!(user_messages, 2);
    assert_eq!(app.db.list_recent_tickets(10).await.unwrap().len(), 1);

    // Replies stay threaded on the root message
    assert!(app
        .replies
        .sent()
        .iter()
        .all(|r| r.reply_to.as_deref() == Some("100")));
}

#[tokio::test]
async fn test_different_chats_get_separate_tickets() {
    let app = TestApp::new(FixedTriage::answer("Noted")).await;

    let first = app.deliver(slack_message("C1", "100", "help")).await.unwrap();
    let second = app.deliver(slack_message("C2", "100", "help")).await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test]
async fn test_escalation_verdict_pages_engineer() {
    let app = TestApp::new(FixedTriage::escalate(0.95)).await;
    let engineer = create_engineer(&app.db, "Alice", true, true, Some("tg-alice")).await;
    app.pager.script(&engineer.id, &[true]);

    let ticket_id = app
        .deliver(slack_message("C1", "200", "production is down, call someone"))
        .await
        .unwrap();

    let ticket = app.db.get_ticket(&ticket_id).await.unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::Escalated);
    assert_eq!(ticket.current_engineer_id, Some(engineer.id.clone()));
    assert_eq!(ticket.severity, Some(0.95));

    let actions = app.db.list_actions(&ticket_id).await.unwrap();
    let kinds: Vec<_> = actions.iter().map(|a| a.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ActionKind::UserMessage,
            ActionKind::LlmAnswer,
            ActionKind::EscalationCall
        ]
    );
    assert_eq!(actions[2].success, Some(true));
    assert_eq!(app.pager.calls_for(&engineer.id), 1);
}

#[tokio::test]
async fn test_escalation_without_engineers_stays_pending() {
    let app = TestApp::new(FixedTriage::escalate(0.9)).await;

    let ticket_id = app
        .deliver(slack_message("C1", "300", "everything is on fire"))
        .await
        .unwrap();

    let ticket = app.db.get_ticket(&ticket_id).await.unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::EscalationPending);
    assert!(ticket.summary().escalation_pending);
    assert!(app.pager.calls().is_empty());
}

#[tokio::test]
async fn test_out_of_range_severity_is_clamped() {
    let app = TestApp::new(FixedTriage::escalate(3.5)).await;

    let ticket_id = app.deliver(slack_message("C1", "400", "urgent")).await.unwrap();

    let ticket = app.db.get_ticket(&ticket_id).await.unwrap().unwrap();
    assert_eq!(ticket.severity, Some(1.0));
}

#[tokio::test]
async fn test_message_reopens_closed_ticket() {
    let app = TestApp::new(FixedTriage::answer("Have you tried restarting?")).await;

    let ticket_id = app.deliver(slack_message("C1", "500", "vpn broken")).await.unwrap();
    app.state
        .ticket_service
        .update_status(&operator(), &ticket_id, TicketStatus::Closed)
        .await
        .unwrap();

    let receipt = app
        .state
        .ingest_service
        .handle_inbound(slack_message("C1", "501", "it broke again"))
        .await
        .unwrap();
    assert_eq!(receipt.ticket_id, ticket_id);
    assert!(receipt.reopened);
    assert!(!receipt.created);
    app.spawner.wait_idle().await;

    let ticket = app.db.get_ticket(&ticket_id).await.unwrap().unwrap();
    assert_eq!(ticket.status, TicketStatus::AutoAnswered);

    let actions = app.db.list_actions(&ticket_id).await.unwrap();
    assert!(actions.iter().any(|a| a.kind == ActionKind::SystemEvent
        && a.content == "Ticket reopened by user message"));
}

struct TriageFixture {
    db: Database,
    replies: Arc<RecordingReply>,
    pager: Arc<ScriptedPager>,
    spawner: Arc<CollectingSpawner>,
}

impl TriageFixture {
    async fn new() -> Self {
        Self {
            db: setup_test_db().await,
            replies: Arc::new(RecordingReply::default()),
            pager: Arc::new(ScriptedPager::new()),
            spawner: Arc::new(CollectingSpawner::default()),
        }
    }

    fn service(
        &self,
        engine: Arc<dyn TriageEngine>,
        tickets: Arc<dyn TicketRepository>,
    ) -> TriageService {
        let broadcaster = Arc::new(RecordingBroadcaster::default());
        let escalation = EscalationService::new(
            tickets.clone(),
            Arc::new(self.db.clone()),
            self.pager.clone(),
            broadcaster.clone(),
            Arc::new(InstantTime::default()),
            self.spawner.clone(),
            EscalationConfig::default(),
        );
        TriageService::new(engine, tickets, self.replies.clone(), broadcaster, escalation)
    }

    async fn assert_untouched(&self, ticket_id: &str) {
        self.spawner.wait_idle().await;
        let ticket = self.db.get_ticket(ticket_id).await.unwrap().unwrap();
        assert_eq!(ticket.status, TicketStatus::Closed);
        assert_eq!(ticket.severity, None);
        assert!(self
            .db
            .list_actions(ticket_id)
            .await
            .unwrap()
            .iter()
            .all(|a| a.kind != ActionKind::LlmAnswer && a.kind != ActionKind::EscalationCall));
        assert!(self.replies.sent().is_empty());
        assert!(self.pager.calls().is_empty());
    }
}

/// Closes the ticket while the verdict is being computed
struct ClosingTriage {
    db: Database,
    ticket_id: String,
}

#[async_trait]
impl TriageEngine for ClosingTriage {
    async fn triage(&self, _text: &str) -> DomainResult<TriageVerdict> {
        self.db
            .transition_status(
                &self.ticket_id,
                &[TicketStatus::Open],
                &StatusUpdate::new(TicketStatus::Closed),
            )
            .await?;
        Ok(FixedTriage::escalate(0.9).0)
    }
}

/// Hands out a snapshot, then closes the ticket before the caller can write
struct ClosesAfterRead {
    inner: Database,
    armed: AtomicBool,
}

#[async_trait]
impl TicketRepository for ClosesAfterRead {
    async fn find_or_create_ticket(
        &self,
        platform: Platform,
        thread_id: &str,
        user_external_id: &str,
    ) -> DomainResult<(Ticket, bool)> {
        self.inner
            .find_or_create_ticket(platform, thread_id, user_external_id)
            .await
    }

    async fn touch_ticket(&self, id: &str) -> DomainResult<bool> {
        self.inner.touch_ticket(id).await
    }

    async fn get_ticket(&self, id: &str) -> DomainResult<Option<Ticket>> {
        let snapshot = self.inner.get_ticket(id).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.inner
                .transition_status(
                    id,
                    &[TicketStatus::Open],
                    &StatusUpdate::new(TicketStatus::Closed),
                )
                .await?;
        }
        Ok(snapshot)
    }

    async fn get_ticket_status(&self, id: &str) -> DomainResult<Option<TicketStatus>> {
        self.inner.get_ticket_status(id).await
    }

    async fn transition_status(
        &self,
        id: &str,
        expected: &[TicketStatus],
        update: &StatusUpdate,
    ) -> DomainResult<bool> {
        self.inner.transition_status(id, expected, update).await
    }

    async fn append_action(&self, action: &NewTicketAction) -> DomainResult<TicketAction> {
        self.inner.append_action(action).await
    }

    async fn list_actions(&self, ticket_id: &str) -> DomainResult<Vec<TicketAction>> {
        self.inner.list_actions(ticket_id).await
    }

    async fn list_recent_tickets(&self, limit: i64) -> DomainResult<Vec<Ticket>> {
        self.inner.list_recent_tickets(limit).await
    }
}

#[tokio::test]
async fn test_late_verdict_leaves_closed_ticket_alone() {
    let f = TriageFixture::new().await;
    let engineer = create_engineer(&f.db, "Alice", true, true, Some("tg-alice")).await;
    f.pager.script(&engineer.id, &[true]);
    let ticket = create_ticket_in(&f.db, "chat:C1:100", TicketStatus::Closed).await;

    let service = f.service(
        Arc::new(FixedTriage::escalate(0.9)),
        Arc::new(f.db.clone()),
    );
    let outcome = service.process(&ticket.id, "funds gone").await;

    assert_eq!(outcome, TriageOutcome::Skipped);
    f.assert_untouched(&ticket.id).await;
}

#[tokio::test]
async fn test_ticket_closed_during_triage_is_skipped() {
    let f = TriageFixture::new().await;
    let engineer = create_engineer(&f.db, "Alice", true, true, Some("tg-alice")).await;
    f.pager.script(&engineer.id, &[true]);
    let ticket = create_ticket_in(&f.db, "chat:C1:100", TicketStatus::Open).await;

    let engine = ClosingTriage {
        db: f.db.clone(),
        ticket_id: ticket.id.clone(),
    };
    let service = f.service(Arc::new(engine), Arc::new(f.db.clone()));
    let outcome = service.process(&ticket.id, "funds gone").await;

    assert_eq!(outcome, TriageOutcome::Skipped);
    f.assert_untouched(&ticket.id).await;
}

#[tokio::test]
async fn test_status_change_after_reread_loses_the_race() {
    let f = TriageFixture::new().await;
    let engineer = create_engineer(&f.db, "Alice", true, true, Some("tg-alice")).await;
    f.pager.script(&engineer.id, &[true]);
    let ticket = create_ticket_in(&f.db, "chat:C1:100", TicketStatus::Open).await;

    let racing = ClosesAfterRead {
        inner: f.db.clone(),
        armed: AtomicBool::new(true),
    };
    let service = f.service(Arc::new(FixedTriage::escalate(0.9)), Arc::new(racing));
    let outcome = service.process(&ticket.id, "funds gone").await;

    assert_eq!(outcome, TriageOutcome::RaceLost);
    f.assert_untouched(&ticket.id).await;
}

#[tokio::test]
async fn test_messages_outside_allow_list_are_ignored() {
    let settings = Settings {
        allowed_sources: SourceAllowList::new(["slack:C1"]),
        ..Settings::default()
    };
    let app = TestApp::build(FixedTriage::answer("Noted"), ScriptedPager::new(), settings).await;

    assert!(app.deliver(slack_message("C2", "200", "hello")).await.is_none());
    assert!(app.db.list_recent_tickets(10).await.unwrap().is_empty());
    assert!(app.replies.sent().is_empty());

    assert!(app.deliver(slack_message("C1", "100", "hello")).await.is_some());
    assert_eq!(app.db.list_recent_tickets(10).await.unwrap().len(), 1);
}
