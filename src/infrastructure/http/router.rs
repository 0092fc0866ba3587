use crate::infrastructure::http::controllers as api;
use crate::infrastructure::http::middleware::{require_auth, require_ingest_token, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};

const MAX_BODY_BYTES: usize = 256 * 1024;

pub fn build_router(state: AppState) -> Router {
    // Operator routes (require x-auth-token)
    let protected = Router::new()
        .route("/api/tickets", get(api::tickets::list_tickets))
        .route("/api/tickets/:id", get(api::tickets::get_ticket))
        .route("/api/tickets/:id/status", post(api::tickets::update_status))
        .route("/api/tickets/:id/notes", post(api::tickets::add_note))
        .route(
            "/api/tickets/:id/escalate",
            post(api::tickets::escalate_ticket),
        )
        .route(
            "/api/engineers",
            get(api::engineers::list_engineers).post(api::engineers::create_engineer),
        )
        .route("/api/engineers/:id/active", post(api::engineers::set_active))
        .route(
            "/api/engineers/:id/on_call",
            post(api::engineers::set_on_call),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Platform bridges
    let ingest = Router::new()
        .route("/api/messages", post(api::messages::receive_message))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_ingest_token,
        ));

    Router::new()
        .route("/health", get(health_handler))
        // The socket authenticates in-band with an auth frame
        .route("/ws", get(api::realtime::ws_handler))
        .merge(protected)
        .merge(ingest)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "OK"
}
