use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
///
/// Non-POST requests to /api/transcript get a 405 from axum's method
/// routing, which is what the upstream delivery system expects.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Webhook ingestion
        .route("/api/transcript", post(handlers::ingest_transcript))
        // Transcript queries (markProcessed requires the POST variant)
        .route(
            "/api/transcripts",
            get(handlers::query_transcripts_get).post(handlers::query_transcripts_post),
        )
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
