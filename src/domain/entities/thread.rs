use super::ticket::Platform;
use crate::domain::errors::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Send-capable reference to a chat peer.
///
/// Serialised forms:
///   user:<userId>:<accessHash>
///   channel:<channelId>:<accessHash>
///   chat:<chatId>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PeerKey {
    User { id: String, access_hash: String },
    Channel { id: String, access_hash: String },
    Chat { id: String },
}

impl fmt::Display for PeerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerKey::User { id, access_hash } => write!(f, "user:{}:{}", id, access_hash),
            PeerKey::Channel { id, access_hash } => write!(f, "channel:{}:{}", id, access_hash),
            PeerKey::Chat { id } => write!(f, "chat:{}", id),
        }
    }
}

impl FromStr for PeerKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        let non_empty = parts.iter().all(|p| !p.is_empty());
        match parts.as_slice() {
            ["user", id, hash] if non_empty => Ok(PeerKey::User {
                id: id.to_string(),
                access_hash: hash.to_string(),
            }),
            ["channel", id, hash] if non_empty => Ok(PeerKey::Channel {
                id: id.to_string(),
                access_hash: hash.to_string(),
            }),
            ["chat", id] if non_empty => Ok(PeerKey::Chat { id: id.to_string() }),
            _ => Err(DomainError::ValidationError(format!(
                "Unrecognised peer key '{}'",
                s
            ))),
        }
    }
}

/// Peer half of a thread key.
///
/// `BestEffort` carries the raw chat identity when the platform could not
/// produce a stable addressable peer. Replies sent to it may not arrive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PeerIdentity {
    Resolved(PeerKey),
    BestEffort(String),
}

impl PeerIdentity {
    /// Parses a stored peer, keeping unknown formats as best-effort raw ids
    pub fn parse(raw: &str) -> Self {
        match raw.parse::<PeerKey>() {
            Ok(key) => PeerIdentity::Resolved(key),
            Err(_) => PeerIdentity::BestEffort(raw.to_string()),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, PeerIdentity::Resolved(_))
    }
}

impl fmt::Display for PeerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerIdentity::Resolved(key) => write!(f, "{}", key),
            PeerIdentity::BestEffort(raw) => write!(f, "{}", raw),
        }
    }
}

/// `peerIdentity:rootMessageId`, unique per platform
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ThreadKey {
    pub peer: PeerIdentity,
    pub root_message_id: String,
}

impl ThreadKey {
    pub fn new(peer: PeerIdentity, root_message_id: impl Into<String>) -> Self {
        Self {
            peer,
            root_message_id: root_message_id.into(),
        }
    }

    /// Splits a stored thread id back into peer and root.
    /// The root never contains ':', the peer may.
    pub fn parse(thread_id: &str) -> Option<Self> {
        let (peer, root) = thread_id.rsplit_once(':')?;
        if peer.is_empty() || root.is_empty() {
            return None;
        }
        Some(Self::new(PeerIdentity::parse(peer), root))
    }
}

impl fmt::Display for ThreadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.peer, self.root_message_id)
    }
}

/// A chat message as delivered by a platform bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub platform: Platform,
    /// Raw chat/channel identity, e.g. `-1001234` or `C024BE91L`
    pub chat_id: String,
    pub message_id: String,
    #[serde(default)]
    pub reply_to_message_id: Option<String>,
    #[serde(default)]
    pub sender_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    /// Serialised peer key when the bridge already resolved one
    #[serde(default)]
    pub peer: Option<String>,
}

impl InboundMessage {
    pub fn sender(&self) -> &str {
        self.sender_id.as_deref().unwrap_or("unknown")
    }
}

/// Output of the thread resolver
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedThread {
    pub platform: Platform,
    pub key: ThreadKey,
    /// True when this message started a new logical thread
    pub new_root: bool,
}

impl ResolvedThread {
    pub fn thread_id(&self) -> String {
        self.key.to_string()
    }

    pub fn is_degraded(&self) -> bool {
        !self.key.peer.is_resolved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_key_formats() {
        let user: PeerKey = "user:42:9001".parse().unwrap();
        assert_eq!(
            user,
            PeerKey::User {
                id: "42".to_string(),
                access_hash: "9001".to_string()
            }
        );
        assert_eq!(user.to_string(), "user:42:9001");

        let chat: PeerKey = "chat:77".parse().unwrap();
        assert_eq!(chat.to_string(), "chat:77");

        assert!("-1001234".parse::<PeerKey>().is_err());
        assert!("user:42".parse::<PeerKey>().is_err());
        assert!("channel::1".parse::<PeerKey>().is_err());
    }

    #[test]
    fn test_unknown_peer_falls_back_to_best_effort() {
        assert_eq!(
            PeerIdentity::parse("-1001234"),
            PeerIdentity::BestEffort("-1001234".to_string())
        );
        assert!(PeerIdentity::parse("channel:5:6").is_resolved());
    }

    #[test]
    fn test_thread_key_parses_back() {
        let key = ThreadKey::new(
            PeerIdentity::Resolved(PeerKey::Channel {
                id: "5".to_string(),
                access_hash: "6".to_string(),
            }),
            "1200",
        );
        let encoded = key.to_string();
        assert_eq!(encoded, "channel:5:6:1200");
        assert_eq!(ThreadKey::parse(&encoded), Some(key));

        let degraded = ThreadKey::parse("-1001234:88").unwrap();
        assert_eq!(degraded.peer, PeerIdentity::BestEffort("-1001234".to_string()));
        assert_eq!(degraded.root_message_id, "88");

        assert!(ThreadKey::parse("no-root").is_none());
    }

    #[test]
    fn test_inbound_message_defaults() {
        let msg: InboundMessage = serde_json::from_str(
            r#"{"platform":"telegram","chat_id":"-100","message_id":"5","text":"hi"}"#,
        )
        .unwrap();
        assert_eq!(msg.sender(), "unknown");
        assert!(msg.reply_to_message_id.is_none());
        assert!(msg.sent_at.is_none());
    }
}
