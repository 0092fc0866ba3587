use crate::application::realtime::NotificationHub;
use crate::application::services::{EngineerService, IngestService, TicketService};
use crate::domain::ports::token_verifier::TokenVerifier;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub ingest_service: IngestService,
    pub ticket_service: TicketService,
    pub engineer_service: EngineerService,
    pub hub: Arc<NotificationHub>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub ingest_token: Option<String>,
}
