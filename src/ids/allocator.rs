use super::{durable_id, durable_scope, DatePrefix};
use crate::records::TranscriptRecord;
use crate::store::{StoreKey, TranscriptStore};
use anyhow::{bail, Result};
use std::sync::Arc;
use tracing::{debug, warn};

/// Allocates durable session identifiers and writes the record under the
/// reserved key in one step
///
/// Injectable so tests can substitute a deterministic or fault-injecting
/// allocator.
#[async_trait::async_trait]
pub trait SessionIdAllocator: Send + Sync {
    /// Reserve the smallest free sequence number for `prefix`, stamp the
    /// resulting identifier into `record`, and persist it under that key.
    /// Returns the stored record.
    async fn allocate(&self, prefix: &DatePrefix, record: TranscriptRecord)
        -> Result<TranscriptRecord>;
}

/// Store-backed allocator
///
/// Counting existing keys and then using `count + 1` is racy on its own: two
/// concurrent callers can observe the same count. The reservation therefore
/// goes through the store's conditional put, keyed by the candidate
/// identifier, retrying with the next sequence number on conflict. The
/// conflict is absorbed here and never surfaced to the webhook caller.
pub struct StoreAllocator {
    store: Arc<dyn TranscriptStore>,
    max_attempts: u32,
}

impl StoreAllocator {
    pub fn new(store: Arc<dyn TranscriptStore>) -> Self {
        Self {
            store,
            max_attempts: 1000,
        }
    }
}

#[async_trait::async_trait]
impl SessionIdAllocator for StoreAllocator {
    async fn allocate(
        &self,
        prefix: &DatePrefix,
        record: TranscriptRecord,
    ) -> Result<TranscriptRecord> {
        let scope = durable_scope(prefix);
        let count = self.store.list(Some(&scope)).await?.len() as u32;

        let mut n = count + 1;
        for _ in 0..self.max_attempts {
            let session_id = durable_id(prefix, n);

            let mut candidate = record.clone();
            candidate.session_id = session_id.clone();
            let bytes = serde_json::to_vec_pretty(&candidate)?;

            if self
                .store
                .put_if_absent(&StoreKey::record(&session_id), &bytes)
                .await?
            {
                debug!("Allocated session id {}", session_id);
                return Ok(candidate);
            }

            warn!("Session id {} already taken, retrying", session_id);
            n += 1;
        }

        bail!(
            "Exhausted {} allocation attempts for prefix {}",
            self.max_attempts,
            prefix.as_str()
        )
    }
}
