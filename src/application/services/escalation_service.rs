use crate::domain::entities::{
    escalation_candidates, Engineer, NewTicketAction, StatusUpdate, TicketStatus,
};
use crate::domain::ports::{
    engineer_repository::EngineerRepository, paging_transport::PagingTransport,
    task_spawner::TaskSpawner, ticket_broadcaster::TicketBroadcaster,
    ticket_repository::TicketRepository, time_service::TimeService,
};
use crate::domain::services::state_machine::{next_status, Trigger};
use crate::infrastructure::observability::{ESCALATION_ATTEMPTS, TICKETS_ESCALATED};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EscalationConfig {
    /// Paging attempts per engineer before moving to the next candidate
    pub max_retries_per_engineer: u32,
    /// Pause between two attempts on the same engineer
    pub retry_delay: Duration,
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            max_retries_per_engineer: 2,
            retry_delay: Duration::from_secs(30),
        }
    }
}

/// How an escalation run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationOutcome {
    /// Another run for the same ticket is in progress in this process
    AlreadyRunning,
    /// Nobody is active or on call
    NoCandidates,
    /// The ticket left `escalation_pending` before or during the run
    Aborted { status: Option<TicketStatus> },
    Escalated { engineer_id: String, attempts: u32 },
    /// Every candidate was tried without success
    Exhausted { attempts: u32 },
    /// A store call failed; the run was abandoned
    Failed(String),
}

/// Pages engineers in priority order until one page goes through.
///
/// The ticket status is re-read before every attempt and the final write is a
/// compare-and-set, so concurrent runs produce at most one `escalated`
/// transition. Closing the ticket is the only way to cancel a run.
#[derive(Clone)]
pub struct EscalationService {
    tickets: Arc<dyn TicketRepository>,
    engineers: Arc<dyn EngineerRepository>,
    pager: Arc<dyn PagingTransport>,
    broadcaster: Arc<dyn TicketBroadcaster>,
    time: Arc<dyn TimeService>,
    spawner: Arc<dyn TaskSpawner>,
    config: EscalationConfig,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

struct InFlightGuard {
    ticket_id: String,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut set) = self.in_flight.lock() {
            set.remove(&self.ticket_id);
        }
    }
}

impl EscalationService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        engineers: Arc<dyn EngineerRepository>,
        pager: Arc<dyn PagingTransport>,
        broadcaster: Arc<dyn TicketBroadcaster>,
        time: Arc<dyn TimeService>,
        spawner: Arc<dyn TaskSpawner>,
        config: EscalationConfig,
    ) -> Self {
        Self {
            tickets,
            engineers,
            pager,
            broadcaster,
            time,
            spawner,
            config,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Starts `escalate` in the background and returns immediately
    pub fn spawn_escalation(&self, ticket_id: &str) {
        let service = self.clone();
        let ticket_id = ticket_id.to_string();
        self.spawner.spawn(Box::pin(async move {
            let outcome = service.escalate(&ticket_id).await;
            tracing::debug!("Escalation for ticket {} finished: {:?}", ticket_id, outcome);
        }));
    }

    fn claim(&self, ticket_id: &str) -> Option<InFlightGuard> {
        let mut set = match self.in_flight.lock() {
            Ok(set) => set,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !set.insert(ticket_id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            ticket_id: ticket_id.to_string(),
            in_flight: self.in_flight.clone(),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn escalate(&self, ticket_id: &str) -> EscalationOutcome {
        let Some(_guard) = self.claim(ticket_id) else {
            tracing::info!("Escalation already running for ticket {}", ticket_id);
            return EscalationOutcome::AlreadyRunning;
        };

        let candidates = match self.engineers.list_engineers().await {
            Ok(engineers) => escalation_candidates(engineers),
            Err(e) => {
                tracing::error!("Failed to fetch engineers for ticket {}: {}", ticket_id, e);
                return EscalationOutcome::Failed(e.to_string());
            }
        };

        if candidates.is_empty() {
            tracing::warn!(
                "No engineers (active or on-call) found, escalation aborted for ticket {}",
                ticket_id
            );
            return EscalationOutcome::NoCandidates;
        }

        let retries = self.config.max_retries_per_engineer;
        let mut attempts = 0u32;

        for engineer in &candidates {
            for retry in 0..retries {
                match self.tickets.get_ticket_status(ticket_id).await {
                    Ok(Some(TicketStatus::EscalationPending)) => {}
                    Ok(status) => {
                        tracing::info!(
                            "Ticket {} is {:?}, aborting escalation",
                            ticket_id,
                            status
                        );
                        return EscalationOutcome::Aborted { status };
                    }
                    Err(e) => {
                        tracing::error!("Failed to re-read ticket {}: {}", ticket_id, e);
                        return EscalationOutcome::Failed(e.to_string());
                    }
                }

                attempts += 1;
                let delivered = self.page_once(ticket_id, engineer, retry).await;

                if delivered {
                    return self.mark_escalated(ticket_id, engineer, attempts).await;
                }

                if retry + 1 < retries {
                    self.time.sleep(self.config.retry_delay).await;
                }
            }
        }

        tracing::warn!(
            "Escalation attempts exhausted for ticket {} after {} attempts",
            ticket_id,
            attempts
        );
        EscalationOutcome::Exhausted { attempts }
    }

    /// One page plus its audit row. Returns whether the page went through.
    async fn page_once(&self, ticket_id: &str, engineer: &Engineer, retry: u32) -> bool {
        let method = engineer.escalation_method();
        let delivered = match self.pager.page(engineer, method).await {
            Ok(delivered) => delivered,
            Err(e) => {
                tracing::error!("Escalation call to engineer {} failed: {}", engineer.id, e);
                false
            }
        };

        metrics::counter!(
            ESCALATION_ATTEMPTS,
            "outcome" => if delivered { "placed" } else { "failed" }
        )
        .increment(1);

        let action =
            NewTicketAction::escalation_call(ticket_id, &engineer.id, method, retry, delivered);
        if let Err(e) = self.tickets.append_action(&action).await {
            tracing::error!(
                "Failed to record escalation_call for ticket {}: {}",
                ticket_id,
                e
            );
        }

        tracing::info!(
            ticket_id,
            engineer_id = %engineer.id,
            method = %method,
            retry,
            delivered,
            "Escalation call attempted"
        );
        delivered
    }

    async fn mark_escalated(
        &self,
        ticket_id: &str,
        engineer: &Engineer,
        attempts: u32,
    ) -> EscalationOutcome {
        let target = match next_status(TicketStatus::EscalationPending, Trigger::PageSucceeded) {
            Ok(target) => target,
            Err(e) => return EscalationOutcome::Failed(e.to_string()),
        };
        let update = StatusUpdate::new(target).with_engineer(engineer.id.clone());

        match self
            .tickets
            .transition_status(ticket_id, &[TicketStatus::EscalationPending], &update)
            .await
        {
            Ok(true) => {
                metrics::counter!(TICKETS_ESCALATED).increment(1);
                tracing::info!("Ticket {} escalated to engineer {}", ticket_id, engineer.id);
                self.notify(ticket_id).await;
                EscalationOutcome::Escalated {
                    engineer_id: engineer.id.clone(),
                    attempts,
                }
            }
            Ok(false) => {
                let status = self.tickets.get_ticket_status(ticket_id).await.ok().flatten();
                tracing::info!(
                    "Ticket {} moved to {:?} while paging, keeping the newer state",
                    ticket_id,
                    status
                );
                EscalationOutcome::Aborted { status }
            }
            Err(e) => {
                tracing::error!("Failed to update ticket {} to escalated: {}", ticket_id, e);
                EscalationOutcome::Failed(e.to_string())
            }
        }
    }

    async fn notify(&self, ticket_id: &str) {
        match self.tickets.get_ticket(ticket_id).await {
            Ok(Some(ticket)) => self.broadcaster.ticket_changed(ticket.summary()).await,
            Ok(None) => {}
            Err(e) => tracing::warn!("Broadcast skipped for ticket {}: {}", ticket_id, e),
        }
    }
}
