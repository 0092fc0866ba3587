use crate::domain::entities::Engineer;
use crate::domain::errors::DomainResult;
use async_trait::async_trait;

#[async_trait]
pub trait EngineerRepository: Send + Sync {
    async fn create_engineer(&self, engineer: &Engineer) -> DomainResult<()>;

    async fn get_engineer(&self, id: &str) -> DomainResult<Option<Engineer>>;

    /// All engineers in a stable order
    async fn list_engineers(&self) -> DomainResult<Vec<Engineer>>;

    /// Returns false when no engineer has this id
    async fn set_active(&self, id: &str, active: bool) -> DomainResult<bool>;

    /// Returns false when no engineer has this id
    async fn set_on_call(&self, id: &str, on_call: bool) -> DomainResult<bool>;

    async fn count_on_call_excluding(&self, id: &str) -> DomainResult<i64>;
}
