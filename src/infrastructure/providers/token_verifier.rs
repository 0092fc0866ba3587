use super::{external_error, http_client};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::token_verifier::TokenVerifier;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IntrospectResponse {
    user_id: Option<String>,
}

/// Checks dashboard tokens against the auth service's introspection endpoint.
///
/// The token travels in `x-auth-token`; a 2xx answer carrying `{"userId"}`
/// accepts it, 401/403 rejects it.
pub struct HttpTokenVerifier {
    client: Client,
    introspect_url: String,
}

impl HttpTokenVerifier {
    pub fn new(introspect_url: impl Into<String>) -> DomainResult<Self> {
        Ok(Self {
            client: http_client(Duration::from_secs(10))?,
            introspect_url: introspect_url.into(),
        })
    }
}

#[async_trait]
impl TokenVerifier for HttpTokenVerifier {
    async fn verify(&self, token: &str) -> DomainResult<Option<String>> {
        if token.trim().is_empty() {
            return Ok(None);
        }

        let response = self
            .client
            .post(&self.introspect_url)
            .header("x-auth-token", token)
            .send()
            .await
            .map_err(|e| external_error("Token introspection", e))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status if status.is_success() => {
                let body: IntrospectResponse = response
                    .json()
                    .await
                    .map_err(|e| external_error("Token introspection", e))?;
                Ok(body.user_id.filter(|id| !id.is_empty()))
            }
            status => Err(DomainError::External(format!(
                "Token introspection returned HTTP {}",
                status.as_u16()
            ))),
        }
    }
}
