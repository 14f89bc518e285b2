//! HTTP API server
//!
//! This module exposes the ingestion webhook and the transcript read API:
//! - POST /api/transcript - end-of-call report ingestion
//! - GET|POST /api/transcripts - query by id / latest / unprocessed,
//!   mark-processed (POST), or the full metadata listing
//! - GET /health - health check

mod handlers;
mod routes;
mod state;

pub use handlers::{ErrorResponse, IngestResponse, TranscriptsQuery};
pub use routes::create_router;
pub use state::AppState;
