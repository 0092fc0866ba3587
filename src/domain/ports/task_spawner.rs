use futures::future::BoxFuture;

/// Runs detached work (triage, escalation) without blocking the caller
pub trait TaskSpawner: Send + Sync {
    fn spawn(&self, future: BoxFuture<'static, ()>);
}
