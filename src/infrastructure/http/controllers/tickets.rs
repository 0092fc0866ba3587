use crate::application::services::{
    AddNoteRequest, EscalationOutcome, TicketDetail, UpdateStatusRequest,
};
use crate::domain::entities::{TicketAction, TicketSummary};
use crate::infrastructure::http::middleware::{ApiResult, AppState, AuthenticatedUser};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
pub struct ListTicketsQuery {
    pub limit: Option<i64>,
}

pub async fn list_tickets(
    State(state): State<AppState>,
    Query(query): Query<ListTicketsQuery>,
) -> ApiResult<Json<Vec<TicketSummary>>> {
    let tickets = state.ticket_service.list_recent(query.limit).await?;
    Ok(Json(tickets))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TicketDetail>> {
    Ok(Json(state.ticket_service.get_ticket(&id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> ApiResult<Json<TicketSummary>> {
    let summary = state
        .ticket_service
        .update_status(&auth_user, &id, request.status)
        .await?;
    Ok(Json(summary))
}

pub async fn add_note(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
    Json(request): Json<AddNoteRequest>,
) -> ApiResult<(StatusCode, Json<TicketAction>)> {
    let action = state
        .ticket_service
        .add_note(&auth_user, &id, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(action)))
}

pub async fn escalate_ticket(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthenticatedUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    tracing::info!("Manual escalation of ticket {} by {}", id, auth_user.user_id);
    let outcome = state.ticket_service.escalate_now(&id).await?;

    let body = match outcome {
        EscalationOutcome::Escalated {
            engineer_id,
            attempts,
        } => json!({ "outcome": "escalated", "engineer_id": engineer_id, "attempts": attempts }),
        EscalationOutcome::Exhausted { attempts } => {
            json!({ "outcome": "exhausted", "attempts": attempts })
        }
        EscalationOutcome::NoCandidates => json!({ "outcome": "no_candidates" }),
        EscalationOutcome::AlreadyRunning => json!({ "outcome": "already_running" }),
        EscalationOutcome::Aborted { status } => {
            json!({ "outcome": "aborted", "status": status })
        }
        EscalationOutcome::Failed(error) => json!({ "outcome": "failed", "error": error }),
    };
    Ok(Json(body))
}
