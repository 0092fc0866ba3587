pub mod paging;
pub mod peer_directory;
pub mod reply;
pub mod token_verifier;
pub mod triage;

pub use paging::*;
pub use peer_directory::*;
pub use reply::*;
pub use token_verifier::*;
pub use triage::*;

use crate::domain::errors::DomainError;
use reqwest::Client;
use std::time::Duration;

/// Shared builder for the outbound HTTP adapters
pub(crate) fn http_client(timeout: Duration) -> Result<Client, DomainError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DomainError::Internal(format!("Failed to build HTTP client: {}", e)))
}

pub(crate) fn external_error(target: &str, err: reqwest::Error) -> DomainError {
    let detail = if err.is_timeout() {
        format!("timeout: {}", err)
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    };
    DomainError::External(format!("{} request failed, {}", target, detail))
}
