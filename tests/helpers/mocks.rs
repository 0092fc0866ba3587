use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;
use triagedesk::domain::entities::{Engineer, EscalationMethod, PeerIdentity, TicketSummary};
use triagedesk::domain::errors::{DomainError, DomainResult};
use triagedesk::domain::ports::{
    paging_transport::PagingTransport, reply_transport::ReplyTransport,
    task_spawner::TaskSpawner, ticket_broadcaster::TicketBroadcaster,
    time_service::TimeService, token_verifier::TokenVerifier,
    triage_engine::{TriageEngine, TriageVerdict},
};

pub const VALID_TOKEN: &str = "valid-token";
pub const OPERATOR_ID: &str = "operator-1";

/// Pager with per-engineer scripted results; unscripted pages fail
#[derive(Default)]
pub struct ScriptedPager {
    results: Mutex<HashMap<String, VecDeque<bool>>>,
    calls: Mutex<Vec<(String, EscalationMethod)>>,
    delay: Option<Duration>,
}

impl ScriptedPager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn script(&self, engineer_id: &str, results: &[bool]) {
        self.results
            .lock()
            .unwrap()
            .insert(engineer_id.to_string(), results.iter().copied().collect());
    }

    pub fn calls(&self) -> Vec<(String, EscalationMethod)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, engineer_id: &str) -> usize {
        self.calls()
            .iter()
            .filter(|(id, _)| id == engineer_id)
            .count()
    }
}

#[async_trait]
impl PagingTransport for ScriptedPager {
    async fn page(&self, engineer: &Engineer, method: EscalationMethod) -> DomainResult<bool> {
        self.calls
            .lock()
            .unwrap()
            .push((engineer.id.clone(), method));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self
            .results
            .lock()
            .unwrap()
            .get_mut(&engineer.id)
            .and_then(|q| q.pop_front());
        Ok(next.unwrap_or(false))
    }
}

/// Pager whose transport always errors
pub struct BrokenPager;

#[async_trait]
impl PagingTransport for BrokenPager {
    async fn page(&self, _engineer: &Engineer, _method: EscalationMethod) -> DomainResult<bool> {
        Err(DomainError::External("gateway down".to_string()))
    }
}

/// Returns immediately and records requested delays
#[derive(Default)]
pub struct InstantTime {
    sleeps: Mutex<Vec<Duration>>,
}

impl InstantTime {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl TimeService for InstantTime {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}

/// Spawns onto tokio and keeps handles so tests can wait for quiescence
#[derive(Default)]
pub struct CollectingSpawner {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl CollectingSpawner {
    /// Waits for every spawned task, including tasks spawned by tasks
    pub async fn wait_idle(&self) {
        loop {
            let handles: Vec<_> = self.handles.lock().unwrap().drain(..).collect();
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                handle.await.expect("Background task panicked");
            }
        }
    }
}

impl TaskSpawner for CollectingSpawner {
    fn spawn(&self, future: BoxFuture<'static, ()>) {
        let handle = tokio::spawn(future);
        self.handles.lock().unwrap().push(handle);
    }
}

#[derive(Default)]
pub struct RecordingBroadcaster {
    updates: Mutex<Vec<TicketSummary>>,
}

impl RecordingBroadcaster {
    pub fn updates(&self) -> Vec<TicketSummary> {
        self.updates.lock().unwrap().clone()
    }
}

#[async_trait]
impl TicketBroadcaster for RecordingBroadcaster {
    async fn ticket_changed(&self, summary: TicketSummary) {
        self.updates.lock().unwrap().push(summary);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentReply {
    pub peer: PeerIdentity,
    pub reply_to: Option<String>,
    pub text: String,
}

#[derive(Default)]
pub struct RecordingReply {
    sent: Mutex<Vec<SentReply>>,
}

impl RecordingReply {
    pub fn sent(&self) -> Vec<SentReply> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReplyTransport for RecordingReply {
    async fn reply(
        &self,
        peer: &PeerIdentity,
        reply_to_message_id: Option<&str>,
        text: &str,
    ) -> DomainResult<()> {
        self.sent.lock().unwrap().push(SentReply {
            peer: peer.clone(),
            reply_to: reply_to_message_id.map(str::to_string),
            text: text.to_string(),
        });
        Ok(())
    }
}

pub struct StaticVerifier;

#[async_trait]
impl TokenVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> DomainResult<Option<String>> {
        Ok((token == VALID_TOKEN).then(|| OPERATOR_ID.to_string()))
    }
}

/// Always returns the same verdict
pub struct FixedTriage(pub TriageVerdict);

impl FixedTriage {
    pub fn answer(text: &str) -> Self {
        Self(TriageVerdict {
            answer: text.to_string(),
            severity: 0.1,
            escalation: false,
        })
    }

    pub fn escalate(severity: f64) -> Self {
        Self(TriageVerdict {
            answer: "Paging an engineer now".to_string(),
            severity,
            escalation: true,
        })
    }
}

#[async_trait]
impl TriageEngine for FixedTriage {
    async fn triage(&self, _text: &str) -> DomainResult<TriageVerdict> {
        Ok(self.0.clone())
    }
}
