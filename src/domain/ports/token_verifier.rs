use crate::domain::errors::DomainResult;
use async_trait::async_trait;

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// `Ok(Some(user_id))` for a valid token, `Ok(None)` for a rejected one.
    /// `Err` signals the verifier itself could not be reached.
    async fn verify(&self, token: &str) -> DomainResult<Option<String>>;
}
