use super::{ApiError, AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";
pub const INGEST_TOKEN_HEADER: &str = "x-ingest-token";

/// Operator identity attached to authenticated requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// Verifies `x-auth-token` through the token verifier and stores the
/// resulting `AuthenticatedUser` in request extensions
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTH_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|t| !t.is_empty())
        .ok_or(ApiError::Unauthorized)?
        .to_string();

    let user_id = match state.token_verifier.verify(&token).await {
        Ok(Some(user_id)) => user_id,
        Ok(None) => return Err(ApiError::Unauthorized),
        Err(e) => {
            tracing::warn!("Token verification unavailable: {}", e);
            return Err(ApiError::BadGateway(
                "Token verification unavailable".to_string(),
            ));
        }
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}

/// Guards the inbound webhook with the shared bridge secret, when configured
pub async fn require_ingest_token(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Some(expected) = state.ingest_token.as_deref() {
        let presented = request
            .headers()
            .get(INGEST_TOKEN_HEADER)
            .and_then(|h| h.to_str().ok());
        if presented != Some(expected) {
            return Err(ApiError::Unauthorized);
        }
    }

    Ok(next.run(request).await)
}
