use crate::application::realtime::{HubConfig, NotificationHub};
use crate::application::services::*;
use crate::config::Config;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{
    engineer_repository::EngineerRepository, paging_transport::PagingTransport,
    peer_directory::PeerDirectory, reply_transport::ReplyTransport, task_spawner::TaskSpawner,
    ticket_broadcaster::TicketBroadcaster, ticket_repository::TicketRepository,
    time_service::TimeService, token_verifier::TokenVerifier, triage_engine::TriageEngine,
};
use crate::infrastructure::http::middleware::AppState;
use crate::infrastructure::persistence::Database;
use crate::infrastructure::providers::*;
use crate::infrastructure::runtime::TokioTimeService;
use std::sync::Arc;

/// Every port implementation the services need
#[derive(Clone)]
pub struct Adapters {
    pub tickets: Arc<dyn TicketRepository>,
    pub engineers: Arc<dyn EngineerRepository>,
    pub triage: Arc<dyn TriageEngine>,
    pub pager: Arc<dyn PagingTransport>,
    pub replies: Arc<dyn ReplyTransport>,
    pub peers: Arc<dyn PeerDirectory>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub time: Arc<dyn TimeService>,
    pub spawner: Arc<dyn TaskSpawner>,
}

#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub escalation: EscalationConfig,
    pub thread: ThreadResolverConfig,
    pub hub: HubConfig,
    pub ingest_token: Option<String>,
    pub allowed_sources: SourceAllowList,
}

impl Settings {
    pub fn from_config(config: &Config) -> DomainResult<Self> {
        let window = chrono::Duration::from_std(config.thread_window).map_err(|e| {
            DomainError::ValidationError(format!("THREAD_WINDOW_SECS out of range: {}", e))
        })?;

        Ok(Self {
            escalation: EscalationConfig {
                max_retries_per_engineer: config.escalation_max_retries,
                retry_delay: config.escalation_retry_delay,
            },
            thread: ThreadResolverConfig {
                window,
                ..ThreadResolverConfig::default()
            },
            hub: HubConfig {
                baseline_limit: config.hub_baseline_limit,
                session_timeout: config.hub_session_timeout,
                sweep_interval: config.hub_sweep_interval,
            },
            ingest_token: config.ingest_token.clone(),
            allowed_sources: SourceAllowList::new(config.allowed_sources.iter().cloned()),
        })
    }
}

/// Picks HTTP adapters where an endpoint is configured and local fallbacks
/// otherwise
pub fn production_adapters(
    db: &Database,
    config: &Config,
    spawner: Arc<dyn TaskSpawner>,
) -> DomainResult<Adapters> {
    let triage: Arc<dyn TriageEngine> = match &config.triage_url {
        Some(url) => Arc::new(HttpTriageEngine::new(url.clone())?),
        None => {
            tracing::warn!("TRIAGE_URL not set, using keyword triage");
            Arc::new(KeywordTriageEngine::new())
        }
    };

    let pager: Arc<dyn PagingTransport> = match &config.pager_url {
        Some(url) => Arc::new(WebhookPagingTransport::new(url.clone())?),
        None => {
            tracing::warn!("PAGER_URL not set, escalation calls will be recorded as failed");
            Arc::new(LoggingPagingTransport)
        }
    };

    let replies: Arc<dyn ReplyTransport> = match &config.reply_url {
        Some(url) => Arc::new(WebhookReplyTransport::new(url.clone())?),
        None => {
            tracing::warn!("REPLY_URL not set, auto-replies are only logged");
            Arc::new(LoggingReplyTransport)
        }
    };

    Ok(Adapters {
        tickets: Arc::new(db.clone()),
        engineers: Arc::new(db.clone()),
        triage,
        pager,
        replies,
        peers: Arc::new(PassthroughPeerDirectory::new()),
        token_verifier: Arc::new(HttpTokenVerifier::new(config.auth_introspect_url.clone())?),
        time: Arc::new(TokioTimeService::new()),
        spawner,
    })
}

/// Wires services and the notification hub together.
///
/// The hub is created first and handed to every producer as its
/// `TicketBroadcaster`.
pub fn build_app_state(adapters: Adapters, settings: Settings) -> AppState {
    let hub = Arc::new(NotificationHub::new(
        adapters.token_verifier.clone(),
        Arc::new(RecentTickets::new(adapters.tickets.clone())),
        settings.hub,
    ));
    let broadcaster: Arc<dyn TicketBroadcaster> = hub.clone();

    let escalation_service = EscalationService::new(
        adapters.tickets.clone(),
        adapters.engineers.clone(),
        adapters.pager.clone(),
        broadcaster.clone(),
        adapters.time.clone(),
        adapters.spawner.clone(),
        settings.escalation,
    );

    let triage_service = TriageService::new(
        adapters.triage.clone(),
        adapters.tickets.clone(),
        adapters.replies.clone(),
        broadcaster.clone(),
        escalation_service.clone(),
    );

    let ingest_service = IngestService::new(
        Arc::new(ThreadResolver::new(adapters.peers.clone(), settings.thread)),
        adapters.tickets.clone(),
        broadcaster.clone(),
        triage_service,
        adapters.spawner.clone(),
        settings.allowed_sources,
    );

    let ticket_service =
        TicketService::new(adapters.tickets.clone(), broadcaster, escalation_service);
    let engineer_service = EngineerService::new(adapters.engineers.clone());

    tracing::info!("Services initialized");

    AppState {
        ingest_service,
        ticket_service,
        engineer_service,
        hub,
        token_verifier: adapters.token_verifier,
        ingest_token: settings.ingest_token,
    }
}
