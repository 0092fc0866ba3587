use crate::domain::entities::Engineer;
use crate::domain::ports::engineer_repository::EngineerRepository;
use crate::infrastructure::http::middleware::error::{ApiError, ApiResult};
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateEngineerRequest {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub telegram_id: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub on_call: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetOnCallRequest {
    #[serde(alias = "is_on_call")]
    pub on_call: bool,
}

#[derive(Clone)]
pub struct EngineerService {
    engineers: Arc<dyn EngineerRepository>,
}

impl EngineerService {
    pub fn new(engineers: Arc<dyn EngineerRepository>) -> Self {
        Self { engineers }
    }

    pub async fn list_engineers(&self) -> ApiResult<Vec<Engineer>> {
        Ok(self.engineers.list_engineers().await?)
    }

    pub async fn create_engineer(&self, request: CreateEngineerRequest) -> ApiResult<Engineer> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(ApiError::BadRequest("Engineer name is required".to_string()));
        }
        if request.telegram_id.is_none() && request.phone_number.is_none() {
            return Err(ApiError::BadRequest(
                "An engineer needs a telegram_id or a phone_number to be paged".to_string(),
            ));
        }

        let engineer = Engineer {
            email: request.email,
            telegram_id: request.telegram_id,
            phone_number: request.phone_number,
            active: request.active,
            on_call: request.on_call,
            ..Engineer::new(name)
        };
        self.engineers.create_engineer(&engineer).await?;
        Ok(engineer)
    }

    #[tracing::instrument(skip(self))]
    pub async fn set_active(&self, id: &str, active: bool) -> ApiResult<Engineer> {
        if !self.engineers.set_active(id, active).await? {
            return Err(ApiError::NotFound(format!("Engineer {} not found", id)));
        }
        tracing::info!("Engineer {} active set to {}", id, active);
        self.require_engineer(id).await
    }

    /// Taking someone off call is refused when nobody else would remain on call
    #[tracing::instrument(skip(self))]
    pub async fn set_on_call(&self, id: &str, on_call: bool) -> ApiResult<Engineer> {
        let engineer = self.require_engineer(id).await?;

        if !on_call && engineer.on_call {
            let others = self.engineers.count_on_call_excluding(id).await?;
            if others == 0 {
                return Err(ApiError::BadRequest(
                    "At least one engineer must remain on call".to_string(),
                ));
            }
        }

        if !self.engineers.set_on_call(id, on_call).await? {
            return Err(ApiError::NotFound(format!("Engineer {} not found", id)));
        }
        tracing::info!("Engineer {} on-call set to {}", id, on_call);
        self.require_engineer(id).await
    }

    async fn require_engineer(&self, id: &str) -> ApiResult<Engineer> {
        self.engineers
            .get_engineer(id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("Engineer {} not found", id)))
    }
}
