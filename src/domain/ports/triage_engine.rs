use crate::domain::errors::DomainResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Classification of one user message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageVerdict {
    pub answer: String,
    pub severity: f64,
    pub escalation: bool,
}

impl TriageVerdict {
    /// Clamps severity into [0, 1]; NaN becomes 0
    pub fn normalized(mut self) -> Self {
        self.severity = if self.severity.is_nan() {
            0.0
        } else {
            self.severity.clamp(0.0, 1.0)
        };
        self
    }
}

#[async_trait]
pub trait TriageEngine: Send + Sync {
    async fn triage(&self, text: &str) -> DomainResult<TriageVerdict>;
}
