use crate::domain::entities::{InboundMessage, PeerIdentity, PeerKey, ResolvedThread, ThreadKey};
use crate::domain::ports::peer_directory::PeerDirectory;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
pub struct ThreadResolverConfig {
    /// A non-reply message joins the chat's latest thread when it arrives
    /// within this window of the previous message
    pub window: Duration,
    /// How long message→root links are kept for following reply chains
    pub root_retention: Duration,
    /// Pruning kicks in once this many message links are tracked and leaves
    /// at most three quarters of it behind
    pub max_tracked_messages: usize,
}

impl Default for ThreadResolverConfig {
    fn default() -> Self {
        Self {
            window: Duration::minutes(10),
            root_retention: Duration::hours(24),
            max_tracked_messages: 10_000,
        }
    }
}

#[derive(Debug, Clone)]
struct RecentRoot {
    root_message_id: String,
    seen_at: DateTime<Utc>,
}

#[derive(Default)]
struct ResolverState {
    /// chat identity -> latest root in that chat
    recent: HashMap<String, RecentRoot>,
    /// chat identity + message id -> root of the thread the message belongs to
    roots: HashMap<String, RecentRoot>,
}

/// Maps inbound chat messages to stable thread keys.
///
/// Explicit replies follow the replied-to message's root. Messages without a
/// reply reference join the chat's most recent thread while the sliding
/// window is open, otherwise they start a new one.
pub struct ThreadResolver {
    peers: Arc<dyn PeerDirectory>,
    config: ThreadResolverConfig,
    state: Mutex<ResolverState>,
}

impl ThreadResolver {
    pub fn new(peers: Arc<dyn PeerDirectory>, config: ThreadResolverConfig) -> Self {
        Self {
            peers,
            config,
            state: Mutex::new(ResolverState::default()),
        }
    }

    #[tracing::instrument(skip(self, message), fields(platform = %message.platform, chat_id = %message.chat_id))]
    pub async fn resolve(&self, message: &InboundMessage) -> ResolvedThread {
        let peer = self.resolve_peer(message).await;
        let seen_at = message.sent_at.unwrap_or_else(Utc::now);
        let chat_key = format!("{}:{}", message.platform, message.chat_id);

        let mut state = self.state.lock().await;

        let (root, new_root) = match &message.reply_to_message_id {
            Some(reply_to) => {
                let link = format!("{}:{}", chat_key, reply_to);
                let root = state
                    .roots
                    .get(&link)
                    .map(|r| r.root_message_id.clone())
                    .unwrap_or_else(|| reply_to.clone());
                (root, false)
            }
            None => match state.recent.get(&chat_key) {
                Some(recent) if seen_at - recent.seen_at < self.config.window => {
                    (recent.root_message_id.clone(), false)
                }
                _ => (message.message_id.clone(), true),
            },
        };

        let entry = RecentRoot {
            root_message_id: root.clone(),
            seen_at,
        };
        state
            .roots
            .insert(format!("{}:{}", chat_key, message.message_id), entry.clone());
        state.recent.insert(chat_key, entry);

        if state.roots.len() > self.config.max_tracked_messages {
            self.prune(&mut state, seen_at);
        }
        drop(state);

        ResolvedThread {
            platform: message.platform,
            key: ThreadKey::new(peer, root),
            new_root,
        }
    }

    async fn resolve_peer(&self, message: &InboundMessage) -> PeerIdentity {
        if let Some(hint) = &message.peer {
            match hint.parse::<PeerKey>() {
                Ok(key) => return PeerIdentity::Resolved(key),
                Err(e) => tracing::debug!("Ignoring peer hint from bridge: {}", e),
            }
        }

        match self
            .peers
            .resolve_peer(message.platform, &message.chat_id)
            .await
        {
            Ok(key) => PeerIdentity::Resolved(key),
            Err(e) => {
                tracing::debug!(
                    "Peer resolution failed for chat {}, falling back to raw id: {}",
                    message.chat_id,
                    e
                );
                PeerIdentity::BestEffort(message.chat_id.clone())
            }
        }
    }

    fn prune(&self, state: &mut ResolverState, now: DateTime<Utc>) {
        let retention = self.config.root_retention;
        let window = self.config.window;
        state.roots.retain(|_, r| now - r.seen_at < retention);
        state.recent.retain(|_, r| now - r.seen_at < window);

        // Busy chats can keep every link inside retention; drop the oldest
        let target = self.config.max_tracked_messages * 3 / 4;
        if state.roots.len() > target {
            let mut by_age: Vec<(DateTime<Utc>, String)> = state
                .roots
                .iter()
                .map(|(link, r)| (r.seen_at, link.clone()))
                .collect();
            by_age.sort();
            let excess = state.roots.len() - target;
            for (_, link) in by_age.into_iter().take(excess) {
                state.roots.remove(&link);
            }
        }
        tracing::debug!("Pruned thread cache to {} message links", state.roots.len());
    }

    #[cfg(test)]
    async fn tracked_messages(&self) -> usize {
        self.state.lock().await.roots.len()
    }
}
