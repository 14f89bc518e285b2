use super::{StoreEntry, StoreKey, TranscriptStore, META_SENTINEL};
use anyhow::Result;
use std::collections::HashMap;
use tokio::sync::RwLock;

struct Slot {
    value: Vec<u8>,
    generation: u64,
}

/// In-memory store backend
///
/// Backs tests, including the concurrent-allocation tests: `put_if_absent`
/// holds the write lock for the whole check-then-insert, so it is atomic
/// with respect to other store calls.
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Slot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TranscriptStore for MemoryStore {
    async fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.read().await;
        Ok(entries.get(&key.name()).map(|slot| slot.value.clone()))
    }

    async fn put(&self, key: &StoreKey, value: &[u8]) -> Result<()> {
        let mut entries = self.entries.write().await;
        let slot = entries.entry(key.name()).or_insert(Slot {
            value: Vec::new(),
            generation: 0,
        });
        slot.value = value.to_vec();
        slot.generation += 1;
        Ok(())
    }

    async fn put_if_absent(&self, key: &StoreKey, value: &[u8]) -> Result<bool> {
        let mut entries = self.entries.write().await;
        let name = key.name();
        if entries.contains_key(&name) {
            return Ok(false);
        }
        entries.insert(
            name,
            Slot {
                value: value.to_vec(),
                generation: 1,
            },
        );
        Ok(true)
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<StoreEntry>> {
        let entries = self.entries.read().await;
        let mut out: Vec<StoreEntry> = entries
            .iter()
            .filter(|(name, _)| !name.starts_with(META_SENTINEL))
            .filter(|(name, _)| prefix.map_or(true, |p| name.starts_with(p)))
            .map(|(name, slot)| StoreEntry {
                name: name.clone(),
                etag: format!("g{}", slot.generation),
            })
            .collect();
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}
