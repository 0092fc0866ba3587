use crate::domain::entities::{PeerKey, Platform};
use crate::domain::errors::DomainResult;
use async_trait::async_trait;

/// Turns a raw chat id into a peer the reply transport can address later
#[async_trait]
pub trait PeerDirectory: Send + Sync {
    async fn resolve_peer(&self, platform: Platform, chat_id: &str) -> DomainResult<PeerKey>;
}
