use crate::domain::entities::{PeerKey, Platform};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::peer_directory::PeerDirectory;
use async_trait::async_trait;

/// Peer lookup for deployments without a platform session.
///
/// Slack channel ids are addressable as they are. Telegram peers need an
/// access hash only the bridge knows, so they resolve only through the peer
/// hint the bridge attaches to the message.
#[derive(Debug, Clone, Default)]
pub struct PassthroughPeerDirectory;

impl PassthroughPeerDirectory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PeerDirectory for PassthroughPeerDirectory {
    async fn resolve_peer(&self, platform: Platform, chat_id: &str) -> DomainResult<PeerKey> {
        match platform {
            Platform::Slack if !chat_id.is_empty() => Ok(PeerKey::Chat {
                id: chat_id.to_string(),
            }),
            Platform::Slack => Err(DomainError::ValidationError(
                "Empty chat id".to_string(),
            )),
            Platform::Telegram => Err(DomainError::NotFound(format!(
                "No access hash known for telegram chat {}",
                chat_id
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_slack_passes_through_and_telegram_degrades() {
        let directory = PassthroughPeerDirectory::new();

        assert_eq!(
            directory.resolve_peer(Platform::Slack, "C024BE91L").await.unwrap(),
            PeerKey::Chat {
                id: "C024BE91L".to_string()
            }
        );
        assert!(directory
            .resolve_peer(Platform::Telegram, "-1001234")
            .await
            .is_err());
    }
}
