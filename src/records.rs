use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Speaker role in the client-side message log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One role/text pair from the upstream artifact
///
/// Upstream roles are kept as raw strings: the voice backend uses a wider
/// vocabulary ("bot", "system", tool roles) than the client-side log and may
/// chunk utterances at a different granularity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub role: String,

    #[serde(alias = "message")]
    pub text: String,
}

/// A persisted transcript, one per ingested end-of-call report
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptRecord {
    /// Server-allocated durable session identifier (storage key)
    pub session_id: String,

    /// Upstream call identifier, distinct from the session identifier
    pub call_id: String,

    /// When the record was ingested
    pub timestamp: DateTime<Utc>,

    /// Why the upstream call ended, if reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_reason: Option<String>,

    /// Full transcript text blob from upstream
    pub transcript: String,

    /// Ordered role/text pairs as provided by upstream
    #[serde(default)]
    pub messages: Vec<TranscriptLine>,

    /// Whether a downstream consumer has picked this record up
    #[serde(default)]
    pub processed: bool,

    /// Set on the first mark-processed call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl TranscriptRecord {
    /// Build a fresh, unprocessed record. The session identifier is stamped
    /// in by the allocator when the record is written.
    pub fn new(
        call_id: String,
        ended_reason: Option<String>,
        transcript: String,
        messages: Vec<TranscriptLine>,
    ) -> Self {
        Self {
            session_id: String::new(),
            call_id,
            timestamp: Utc::now(),
            ended_reason,
            transcript,
            messages,
            processed: false,
            processed_at: None,
        }
    }
}

/// Singleton meta record referencing the most recently ingested transcript
///
/// Overwritten on every successful ingestion; last-writer-wins under
/// concurrent ingestions, so it may briefly reference a record that is not
/// chronologically latest. That weak consistency is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatestPointer {
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Entry in the metadata-only listing: identifier plus the store backend's
/// cheap content fingerprint, no record body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub integrity_tag: String,
}
