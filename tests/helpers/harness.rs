use super::mocks::*;
use super::test_db::setup_test_db;
use chrono::Utc;
use std::sync::Arc;
use triagedesk::bootstrap::{build_app_state, Adapters, Settings};
use triagedesk::domain::entities::{InboundMessage, Platform};
use triagedesk::domain::ports::triage_engine::TriageEngine;
use triagedesk::infrastructure::http::middleware::AppState;
use triagedesk::infrastructure::persistence::Database;
use triagedesk::infrastructure::providers::PassthroughPeerDirectory;

/// Fully wired application over a fresh database and recording mocks
pub struct TestApp {
    pub db: Database,
    pub state: AppState,
    pub pager: Arc<ScriptedPager>,
    pub replies: Arc<RecordingReply>,
    pub time: Arc<InstantTime>,
    pub spawner: Arc<CollectingSpawner>,
}

impl TestApp {
    pub async fn new(triage: impl TriageEngine + 'static) -> Self {
        Self::with_pager(triage, ScriptedPager::new()).await
    }

    pub async fn with_pager(triage: impl TriageEngine + 'static, pager: ScriptedPager) -> Self {
        Self::build(triage, pager, Settings::default()).await
    }

    pub async fn build(
        triage: impl TriageEngine + 'static,
        pager: ScriptedPager,
        settings: Settings,
    ) -> Self {
        let db = setup_test_db().await;
        let pager = Arc::new(pager);
        let replies = Arc::new(RecordingReply::default());
        let time = Arc::new(InstantTime::default());
        let spawner = Arc::new(CollectingSpawner::default());

        let adapters = Adapters {
            tickets: Arc::new(db.clone()),
            engineers: Arc::new(db.clone()),
            triage: Arc::new(triage),
            pager: pager.clone(),
            replies: replies.clone(),
            peers: Arc::new(PassthroughPeerDirectory::new()),
            token_verifier: Arc::new(StaticVerifier),
            time: time.clone(),
            spawner: spawner.clone(),
        };

        Self {
            db,
            state: build_app_state(adapters, settings),
            pager,
            replies,
            time,
            spawner,
        }
    }

    /// Ingests a message and waits for triage and escalation to settle
    pub async fn deliver(&self, message: InboundMessage) -> Option<String> {
        let receipt = self.state.ingest_service.handle_inbound(message).await;
        self.spawner.wait_idle().await;
        receipt.map(|r| r.ticket_id)
    }
}

pub fn slack_message(chat_id: &str, message_id: &str, text: &str) -> InboundMessage {
    InboundMessage {
        platform: Platform::Slack,
        chat_id: chat_id.to_string(),
        message_id: message_id.to_string(),
        reply_to_message_id: None,
        sender_id: Some("U123".to_string()),
        text: text.to_string(),
        sent_at: Some(Utc::now()),
        peer: None,
    }
}
