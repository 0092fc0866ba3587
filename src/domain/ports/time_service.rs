use async_trait::async_trait;
use std::time::Duration;

/// Suspension between escalation retries; swapped out in tests
#[async_trait]
pub trait TimeService: Send + Sync {
    async fn sleep(&self, duration: Duration);
}
