use crate::domain::entities::PeerIdentity;
use crate::domain::errors::DomainResult;
use async_trait::async_trait;

/// Best-effort reply into a chat thread; callers log failures
#[async_trait]
pub trait ReplyTransport: Send + Sync {
    async fn reply(
        &self,
        peer: &PeerIdentity,
        reply_to_message_id: Option<&str>,
        text: &str,
    ) -> DomainResult<()>;
}
