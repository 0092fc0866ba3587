use crate::domain::entities::InboundMessage;
use crate::infrastructure::http::middleware::{ApiError, ApiResult, AppState};
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

/// Inbound chat message posted by a platform bridge
pub async fn receive_message(
    State(state): State<AppState>,
    Json(message): Json<InboundMessage>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    if message.chat_id.trim().is_empty() || message.message_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "chat_id and message_id are required".to_string(),
        ));
    }

    match state.ingest_service.ingest(message).await? {
        Some(receipt) => Ok((StatusCode::ACCEPTED, Json(json!(receipt)))),
        None => Ok((StatusCode::OK, Json(json!({ "ignored": true })))),
    }
}
