//! Transcript ingestion
//!
//! Consumes end-of-call reports delivered by the voice backend's webhook.
//! Delivery is at-least-once: the same report may arrive more than once and
//! concurrent deliveries for different calls may race. Records are written
//! before the latest pointer, and duplicate deliveries are answered with the
//! already-allocated session id.

use crate::ids::{DatePrefix, SessionIdAllocator};
use crate::records::{LatestPointer, TranscriptLine, TranscriptRecord};
use crate::store::{StoreKey, TranscriptStore};
use anyhow::{Context, Result};
use chrono::DateTime;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Report type that carries a finished transcript; every other type is
/// acknowledged without side effects
pub const END_OF_CALL_REPORT: &str = "end-of-call-report";

// ============================================================================
// Report payload
// ============================================================================

/// Inbound webhook payload. Every field is optional so that irrelevant and
/// incomplete reports deserialize cleanly and can be acknowledged as no-ops
/// instead of bouncing back to the sender's retry queue.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndOfCallReport {
    #[serde(rename = "type")]
    pub kind: Option<String>,

    pub ended_reason: Option<String>,

    pub call: Option<CallInfo>,

    pub artifact: Option<CallArtifact>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallInfo {
    /// Upstream call identifier
    pub id: Option<String>,

    pub started_at: Option<String>,

    pub ended_at: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallArtifact {
    /// Full transcript text blob
    pub transcript: Option<String>,

    /// Upstream role/text pairs
    #[serde(default)]
    pub messages: Vec<ArtifactMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactMessage {
    #[serde(default)]
    pub role: String,

    #[serde(default, alias = "message")]
    pub text: String,
}

// ============================================================================
// Outcome
// ============================================================================

/// Why a report was acknowledged without a write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// `type` was not the end-of-call marker
    NotEndOfCall,
    /// `call.id` missing
    MissingCallId,
    /// `artifact.transcript` missing or empty
    MissingTranscript,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A new record was written under this id
    Ingested { session_id: String },
    /// The call id was seen before; no new record, no pointer update
    Duplicate { session_id: String },
    /// Acknowledged no-op
    Ignored(IgnoreReason),
}

impl IngestOutcome {
    pub fn session_id(&self) -> Option<&str> {
        match self {
            IngestOutcome::Ingested { session_id } | IngestOutcome::Duplicate { session_id } => {
                Some(session_id)
            }
            IngestOutcome::Ignored(_) => None,
        }
    }
}

// ============================================================================
// Service
// ============================================================================

pub struct IngestService {
    store: Arc<dyn TranscriptStore>,
    allocator: Arc<dyn SessionIdAllocator>,
}

impl IngestService {
    pub fn new(store: Arc<dyn TranscriptStore>, allocator: Arc<dyn SessionIdAllocator>) -> Self {
        Self { store, allocator }
    }

    /// Ingest one report. `Ok` covers the acknowledged no-op cases too;
    /// `Err` means the store itself failed and maps to an HTTP 500.
    pub async fn ingest(&self, report: EndOfCallReport) -> Result<IngestOutcome> {
        if report.kind.as_deref() != Some(END_OF_CALL_REPORT) {
            debug!("Ignoring report of type {:?}", report.kind);
            return Ok(IngestOutcome::Ignored(IgnoreReason::NotEndOfCall));
        }

        let call = report.call.unwrap_or_default();
        let Some(call_id) = call.id.filter(|id| !id.is_empty()) else {
            debug!("Ignoring end-of-call report without call.id");
            return Ok(IngestOutcome::Ignored(IgnoreReason::MissingCallId));
        };

        let artifact = report.artifact.unwrap_or_default();
        let Some(transcript) = artifact.transcript.filter(|t| !t.is_empty()) else {
            debug!("Ignoring report for call {} without transcript", call_id);
            return Ok(IngestOutcome::Ignored(IgnoreReason::MissingTranscript));
        };

        // At-least-once delivery: answer a repeat with the original id
        if let Some(session_id) = self.lookup_call(&call_id).await? {
            info!(
                "Duplicate delivery for call {}, already stored as {}",
                call_id, session_id
            );
            return Ok(IngestOutcome::Duplicate { session_id });
        }

        if let Some(secs) = call_duration_secs(&call.started_at, &call.ended_at) {
            info!("Ingesting call {} ({}s)", call_id, secs);
        }

        let messages = artifact
            .messages
            .into_iter()
            .map(|m| TranscriptLine {
                role: m.role,
                text: m.text,
            })
            .collect();

        let record =
            TranscriptRecord::new(call_id.clone(), report.ended_reason, transcript, messages);

        // The allocator writes the record under the reserved key
        let stored = self
            .allocator
            .allocate(&DatePrefix::today(), record)
            .await
            .context("Failed to allocate session id")?;

        self.store
            .put(
                &StoreKey::call_index(&call_id),
                stored.session_id.as_bytes(),
            )
            .await
            .context("Failed to write call index")?;

        // Pointer strictly after the record: it must never reference a key
        // that does not exist
        let pointer = LatestPointer {
            session_id: stored.session_id.clone(),
            timestamp: stored.timestamp,
        };
        self.store
            .put(&StoreKey::Latest, &serde_json::to_vec_pretty(&pointer)?)
            .await
            .context("Failed to update latest pointer")?;

        info!("Stored transcript for call {} as {}", call_id, stored.session_id);

        Ok(IngestOutcome::Ingested {
            session_id: stored.session_id,
        })
    }

    async fn lookup_call(&self, call_id: &str) -> Result<Option<String>> {
        let bytes = self.store.get(&StoreKey::call_index(call_id)).await?;
        Ok(bytes.and_then(|b| String::from_utf8(b).ok()))
    }
}

fn call_duration_secs(started_at: &Option<String>, ended_at: &Option<String>) -> Option<i64> {
    let start = DateTime::parse_from_rfc3339(started_at.as_deref()?).ok()?;
    let end = DateTime::parse_from_rfc3339(ended_at.as_deref()?).ok()?;
    Some(end.signed_duration_since(start).num_seconds())
}
