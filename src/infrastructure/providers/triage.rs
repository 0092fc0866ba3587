use super::{external_error, http_client};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::triage_engine::{TriageEngine, TriageVerdict};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Delegates triage to a remote model endpoint.
///
/// POSTs `{"text": ...}` and expects `{"answer", "severity", "escalation"}`.
pub struct HttpTriageEngine {
    client: Client,
    url: String,
}

impl HttpTriageEngine {
    pub fn new(url: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            client: http_client(Duration::from_secs(60))?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl TriageEngine for HttpTriageEngine {
    async fn triage(&self, text: &str) -> DomainResult<TriageVerdict> {
        let response = self
            .client
            .post(&self.url)
            .json(&json!({ "text": text }))
            .send()
            .await
            .map_err(|e| external_error("Triage", e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::External(format!(
                "Triage endpoint returned HTTP {}",
                status.as_u16()
            )));
        }

        let verdict: TriageVerdict = response
            .json()
            .await
            .map_err(|e| external_error("Triage", e))?;
        Ok(verdict.normalized())
    }
}

/// Phrases that always page an engineer
const ESCALATION_PHRASES: &[&str] = &[
    "funds gone",
    "trade failed",
    "can't close position",
    "cant close position",
    "balance zero",
    "balance is zero",
    "security bug",
];

const FRUSTRATION_WORDS: &[&str] = &["wtf", "unacceptable", "ridiculous"];

const ESCALATION_THRESHOLD: f64 = 0.7;

/// Offline triage used when no model endpoint is configured
#[derive(Debug, Clone, Default)]
pub struct KeywordTriageEngine;

impl KeywordTriageEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(text: &str) -> TriageVerdict {
        let lowered = text.to_lowercase();
        let critical = ESCALATION_PHRASES.iter().any(|p| lowered.contains(p));
        let frustrated = lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| FRUSTRATION_WORDS.contains(&word));

        let severity: f64 = match (critical, frustrated) {
            (true, _) => 0.92,
            (false, true) => 0.75,
            (false, false) => 0.2,
        };

        let escalation = critical || frustrated || severity >= ESCALATION_THRESHOLD;
        let answer = if escalation {
            "Sorry about this. I'm alerting our on-call engineer right now; you'll hear back shortly."
        } else {
            "Thanks for reaching out! We've logged your message and will follow up here if we need anything else."
        };

        TriageVerdict {
            answer: answer.to_string(),
            severity,
            escalation,
        }
    }
}

#[async_trait]
impl TriageEngine for KeywordTriageEngine {
    async fn triage(&self, text: &str) -> DomainResult<TriageVerdict> {
        Ok(Self::classify(text))
    }
}
