use super::protocol::{ClientMessage, ServerMessage};
use super::transport::SessionTransport;
use crate::domain::entities::TicketSummary;
use crate::domain::ports::{
    ticket_broadcaster::{BaselineSource, TicketBroadcaster},
    token_verifier::TokenVerifier,
};
use crate::infrastructure::observability::HUB_SESSIONS;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Tickets pushed right after authentication
    pub baseline_limit: usize,
    /// Sessions without a ping for longer than this are closed
    pub session_timeout: Duration,
    pub sweep_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            baseline_limit: 20,
            session_timeout: Duration::from_secs(30),
            sweep_interval: Duration::from_secs(15),
        }
    }
}

enum SessionState {
    Unauthenticated,
    /// Token accepted, baseline not delivered yet. Updates wait here.
    Syncing { pending: Vec<TicketSummary> },
    Authenticated,
}

struct Session {
    transport: Arc<dyn SessionTransport>,
    state: SessionState,
    user_id: Option<String>,
    last_ping_at: Instant,
}

/// Live dashboard sessions.
///
/// A session sees nothing until its token is verified. It then gets exactly
/// one baseline, followed by every ticket change in order.
pub struct NotificationHub {
    sessions: Mutex<HashMap<String, Session>>,
    verifier: Arc<dyn TokenVerifier>,
    baseline: Arc<dyn BaselineSource>,
    config: HubConfig,
    shutdown_tx: watch::Sender<bool>,
}

impl NotificationHub {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        baseline: Arc<dyn BaselineSource>,
        config: HubConfig,
    ) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            sessions: Mutex::new(HashMap::new()),
            verifier,
            baseline,
            config,
            shutdown_tx,
        }
    }

    pub async fn on_connect(&self, transport: Arc<dyn SessionTransport>) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.sessions.lock().await;
        sessions.insert(
            session_id.clone(),
            Session {
                transport,
                state: SessionState::Unauthenticated,
                user_id: None,
                last_ping_at: Instant::now(),
            },
        );
        record_session_count(sessions.len());
        tracing::debug!("Session {} connected ({} open)", session_id, sessions.len());
        session_id
    }

    pub async fn on_disconnect(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.remove(session_id) {
            tracing::debug!(
                "Session {} disconnected (user {:?})",
                session_id,
                session.user_id
            );
        }
        record_session_count(sessions.len());
    }

    /// Handles one text frame from a client
    pub async fn on_message(&self, session_id: &str, text: &str) {
        match ClientMessage::parse(text) {
            Ok(ClientMessage::Auth { token }) => {
                self.authenticate(session_id, &token).await;
            }
            Ok(ClientMessage::Ping) => {
                let mut sessions = self.sessions.lock().await;
                if let Some(session) = sessions.get_mut(session_id) {
                    session.last_ping_at = Instant::now();
                    if let Err(e) = session.transport.send(&ServerMessage::Ping { success: true }) {
                        tracing::debug!("Ping reply to session {} failed: {}", session_id, e);
                    }
                }
            }
            Err(e) => {
                tracing::debug!("Rejected frame from session {}: {:?}", session_id, e);
                self.send_to(session_id, &ServerMessage::error(e.client_message()))
                    .await;
            }
        }
    }

    /// Verifies `token` and, on success, delivers the baseline.
    ///
    /// The registry lock is not held while the verifier or the baseline source
    /// is awaited.
    #[tracing::instrument(skip(self, token))]
    pub async fn authenticate(&self, session_id: &str, token: &str) -> bool {
        {
            let sessions = self.sessions.lock().await;
            match sessions.get(session_id) {
                None => return false,
                Some(session) if !matches!(session.state, SessionState::Unauthenticated) => {
                    let _ = session.transport.send(&ServerMessage::Auth {
                        success: true,
                        error: None,
                    });
                    return true;
                }
                Some(_) => {}
            }
        }

        let user_id = match self.verifier.verify(token).await {
            Ok(Some(user_id)) => user_id,
            Ok(None) => {
                tracing::info!("Session {} presented an invalid token", session_id);
                self.send_to(
                    session_id,
                    &ServerMessage::Auth {
                        success: false,
                        error: Some("Invalid token".to_string()),
                    },
                )
                .await;
                return false;
            }
            Err(e) => {
                tracing::warn!("Token verification failed for session {}: {}", session_id, e);
                self.send_to(
                    session_id,
                    &ServerMessage::Auth {
                        success: false,
                        error: Some("Authentication unavailable".to_string()),
                    },
                )
                .await;
                return false;
            }
        };

        {
            let mut sessions = self.sessions.lock().await;
            let Some(session) = sessions.get_mut(session_id) else {
                return false;
            };
            if !matches!(session.state, SessionState::Unauthenticated) {
                // A concurrent auth on the same session already won
                return true;
            }
            session.state = SessionState::Syncing {
                pending: Vec::new(),
            };
            session.user_id = Some(user_id.clone());
            if session
                .transport
                .send(&ServerMessage::Auth {
                    success: true,
                    error: None,
                })
                .is_err()
            {
                self.drop_session(&mut sessions, session_id);
                return false;
            }
        }

        let baseline = match self.baseline.recent_tickets(self.config.baseline_limit).await {
            Ok(tickets) => tickets,
            Err(e) => {
                tracing::error!("Failed to load baseline for session {}: {}", session_id, e);
                self.send_to(session_id, &ServerMessage::error("Failed to load tickets"))
                    .await;
                Vec::new()
            }
        };

        let mut sessions = self.sessions.lock().await;
        let Some(session) = sessions.get_mut(session_id) else {
            return false;
        };
        let pending = match std::mem::replace(&mut session.state, SessionState::Authenticated) {
            SessionState::Syncing { pending } => pending,
            _ => Vec::new(),
        };

        let mut delivered = session
            .transport
            .send(&ServerMessage::Baseline(baseline))
            .is_ok();
        for summary in pending {
            if !delivered {
                break;
            }
            delivered = session
                .transport
                .send(&ServerMessage::NewItem(summary))
                .is_ok();
        }

        if !delivered {
            self.drop_session(&mut sessions, session_id);
            return false;
        }

        tracing::info!("Session {} authenticated as {}", session_id, user_id);
        true
    }

    /// Pushes one ticket change to every authenticated session
    pub async fn broadcast(&self, summary: TicketSummary) {
        let mut sessions = self.sessions.lock().await;
        let message = ServerMessage::NewItem(summary.clone());
        let mut stalled = Vec::new();

        for (id, session) in sessions.iter_mut() {
            match &mut session.state {
                SessionState::Unauthenticated => {}
                SessionState::Syncing { pending } => pending.push(summary.clone()),
                SessionState::Authenticated => {
                    if let Err(e) = session.transport.send(&message) {
                        tracing::warn!("Dropping session {}: {}", id, e);
                        stalled.push(id.clone());
                    }
                }
            }
        }

        for id in stalled {
            self.drop_session(&mut sessions, &id);
        }
    }

    /// Closes sessions that have not pinged within the timeout
    pub async fn sweep(&self) -> usize {
        self.sweep_at(Instant::now()).await
    }

    pub async fn sweep_at(&self, now: Instant) -> usize {
        let mut sessions = self.sessions.lock().await;
        let timeout = self.config.session_timeout;
        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, s)| now.saturating_duration_since(s.last_ping_at) > timeout)
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            tracing::info!("Session {} timed out", id);
            self.drop_session(&mut sessions, id);
        }
        expired.len()
    }

    /// Runs `sweep` every `sweep_interval` until `shutdown`
    pub fn start_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let hub = Arc::clone(self);
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(hub.config.sweep_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = hub.sweep().await;
                        if removed > 0 {
                            tracing::debug!("Sweep closed {} idle sessions", removed);
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            tracing::debug!("Session sweeper stopped");
        })
    }

    /// Closes every session and stops the sweeper
    pub async fn shutdown(&self) {
        let mut sessions = self.sessions.lock().await;
        for (_, session) in sessions.drain() {
            session.transport.close();
        }
        record_session_count(0);
        self.shutdown_tx.send_replace(true);
        tracing::info!("Notification hub shut down");
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_authenticated(&self, session_id: &str) -> bool {
        self.sessions
            .lock()
            .await
            .get(session_id)
            .map(|s| matches!(s.state, SessionState::Authenticated))
            .unwrap_or(false)
    }

    async fn send_to(&self, session_id: &str, message: &ServerMessage) {
        let mut sessions = self.sessions.lock().await;
        let failed = match sessions.get(session_id) {
            Some(session) => session.transport.send(message).is_err(),
            None => false,
        };
        if failed {
            self.drop_session(&mut sessions, session_id);
        }
    }

    fn drop_session(&self, sessions: &mut HashMap<String, Session>, session_id: &str) {
        if let Some(session) = sessions.remove(session_id) {
            session.transport.close();
        }
        record_session_count(sessions.len());
    }
}

fn record_session_count(count: usize) {
    metrics::gauge!(HUB_SESSIONS).set(count as f64);
}

#[async_trait]
impl TicketBroadcaster for NotificationHub {
    async fn ticket_changed(&self, summary: TicketSummary) {
        self.broadcast(summary).await;
    }
}
