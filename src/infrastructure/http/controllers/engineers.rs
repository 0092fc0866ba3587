use crate::application::services::{CreateEngineerRequest, SetActiveRequest, SetOnCallRequest};
use crate::domain::entities::Engineer;
use crate::infrastructure::http::middleware::{ApiResult, AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

pub async fn list_engineers(State(state): State<AppState>) -> ApiResult<Json<Vec<Engineer>>> {
    Ok(Json(state.engineer_service.list_engineers().await?))
}

pub async fn create_engineer(
    State(state): State<AppState>,
    Json(request): Json<CreateEngineerRequest>,
) -> ApiResult<(StatusCode, Json<Engineer>)> {
    let engineer = state.engineer_service.create_engineer(request).await?;
    Ok((StatusCode::CREATED, Json(engineer)))
}

pub async fn set_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> ApiResult<Json<Engineer>> {
    Ok(Json(
        state.engineer_service.set_active(&id, request.active).await?,
    ))
}

pub async fn set_on_call(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetOnCallRequest>,
) -> ApiResult<Json<Engineer>> {
    Ok(Json(
        state.engineer_service.set_on_call(&id, request.on_call).await?,
    ))
}
