//! Read-side API over the transcript store
//!
//! Every operation is independent and idempotent. Meta entries (latest
//! pointer, call index) live in their own key namespace, so scans here can
//! never pick them up.

use crate::records::{LatestPointer, SessionSummary, TranscriptRecord};
use crate::store::{StoreKey, TranscriptStore};
use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::info;

/// Bound on concurrent body fetches during the unprocessed scan
const SCAN_CONCURRENCY: usize = 8;

pub struct QueryService {
    store: Arc<dyn TranscriptStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn TranscriptStore>) -> Self {
        Self { store }
    }

    /// Fetch one record by its durable session identifier
    pub async fn get(&self, session_id: &str) -> Result<Option<TranscriptRecord>> {
        let bytes = self.store.get(&StoreKey::record(session_id)).await?;
        bytes.map(|b| decode_record(&b, session_id)).transpose()
    }

    /// Dereference the latest pointer. `None` until the first ingestion.
    pub async fn latest(&self) -> Result<Option<TranscriptRecord>> {
        let Some(bytes) = self.store.get(&StoreKey::Latest).await? else {
            return Ok(None);
        };
        let pointer: LatestPointer =
            serde_json::from_slice(&bytes).context("Corrupt latest pointer")?;
        self.get(&pointer.session_id).await
    }

    /// Every record not yet marked processed, in identifier order
    pub async fn unprocessed(&self) -> Result<Vec<TranscriptRecord>> {
        let entries = self.store.list(None).await?;

        let records: Vec<TranscriptRecord> = stream::iter(entries)
            .map(|entry| async move { self.get(&entry.name).await })
            .buffered(SCAN_CONCURRENCY)
            .try_collect::<Vec<Option<TranscriptRecord>>>()
            .await?
            .into_iter()
            .flatten()
            .filter(|r| !r.processed)
            .collect();

        Ok(records)
    }

    /// Set `processed` and stamp `processedAt` on its first call. Not atomic
    /// against a concurrent mark on the same id: last writer wins, which is
    /// harmless because `processed` only ever moves to true.
    pub async fn mark_processed(&self, session_id: &str) -> Result<Option<TranscriptRecord>> {
        let Some(mut record) = self.get(session_id).await? else {
            return Ok(None);
        };

        record.processed = true;
        if record.processed_at.is_none() {
            record.processed_at = Some(Utc::now());
        }

        self.store
            .put(
                &StoreKey::record(session_id),
                &serde_json::to_vec_pretty(&record)?,
            )
            .await
            .with_context(|| format!("Failed to write back {}", session_id))?;

        info!("Marked {} processed", session_id);
        Ok(Some(record))
    }

    /// Metadata-only listing of every record, no bodies fetched
    pub async fn list_all(&self) -> Result<Vec<SessionSummary>> {
        let entries = self.store.list(None).await?;
        Ok(entries
            .into_iter()
            .map(|e| SessionSummary {
                session_id: e.name,
                integrity_tag: e.etag,
            })
            .collect())
    }
}

fn decode_record(bytes: &[u8], session_id: &str) -> Result<TranscriptRecord> {
    serde_json::from_slice(bytes).with_context(|| format!("Corrupt record {}", session_id))
}
