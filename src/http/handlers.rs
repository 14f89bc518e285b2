use super::state::AppState;
use crate::ingest::EndOfCallReport;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Query parameters for /api/transcripts. The parameters are mutually
/// exclusive; when several are present the first match in the order below
/// wins.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptsQuery {
    pub id: Option<String>,

    #[serde(default)]
    pub latest: bool,

    #[serde(default)]
    pub unprocessed: bool,

    pub mark_processed: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn not_found(what: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse { error: what.into() }),
    )
        .into_response()
}

fn internal_error(e: anyhow::Error) -> axum::response::Response {
    error!("Request failed: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "Internal error".to_string(),
        }),
    )
        .into_response()
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/transcript
/// Webhook target for end-of-call reports. Irrelevant or incomplete reports
/// are acknowledged with success and no side effect: the sender retries on
/// non-2xx, and a malformed report will never self-correct.
pub async fn ingest_transcript(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let report: EndOfCallReport = match serde_json::from_value(body) {
        Ok(report) => report,
        Err(e) => {
            debug!("Acknowledging unparseable report: {}", e);
            return (
                StatusCode::OK,
                Json(IngestResponse {
                    success: true,
                    session_id: None,
                }),
            )
                .into_response();
        }
    };

    match state.ingest.ingest(report).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(IngestResponse {
                success: true,
                session_id: outcome.session_id().map(String::from),
            }),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /api/transcripts
pub async fn query_transcripts_get(
    State(state): State<AppState>,
    Query(params): Query<TranscriptsQuery>,
) -> impl IntoResponse {
    if params.mark_processed.is_some() {
        return (
            StatusCode::METHOD_NOT_ALLOWED,
            Json(ErrorResponse {
                error: "markProcessed requires POST".to_string(),
            }),
        )
            .into_response();
    }
    query_transcripts(state, params).await
}

/// POST /api/transcripts
pub async fn query_transcripts_post(
    State(state): State<AppState>,
    Query(params): Query<TranscriptsQuery>,
) -> impl IntoResponse {
    query_transcripts(state, params).await
}

async fn query_transcripts(
    state: AppState,
    params: TranscriptsQuery,
) -> axum::response::Response {
    if let Some(id) = params.id {
        return match state.query.get(&id).await {
            Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
            Ok(None) => not_found(format!("Transcript {} not found", id)),
            Err(e) => internal_error(e),
        };
    }

    if params.latest {
        return match state.query.latest().await {
            Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
            Ok(None) => not_found("No transcripts ingested yet"),
            Err(e) => internal_error(e),
        };
    }

    if params.unprocessed {
        return match state.query.unprocessed().await {
            Ok(records) => (StatusCode::OK, Json(records)).into_response(),
            Err(e) => internal_error(e),
        };
    }

    if let Some(id) = params.mark_processed {
        return match state.query.mark_processed(&id).await {
            Ok(Some(record)) => (StatusCode::OK, Json(record)).into_response(),
            Ok(None) => not_found(format!("Transcript {} not found", id)),
            Err(e) => internal_error(e),
        };
    }

    match state.query.list_all().await {
        Ok(summaries) => (StatusCode::OK, Json(summaries)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
