//! Transcript store: a durable key/value namespace keyed by session id
//!
//! The key space is partitioned into two namespaces:
//! - record keys, named by durable session identifiers
//! - meta keys (latest pointer, call-id index), rendered with a sentinel
//!   prefix so they can never collide with a session identifier
//!
//! Listings only ever see record keys. Backends:
//! - `MemoryStore` - in-process map, used by tests
//! - `FsStore` - one JSON file per key under a directory

mod fs;
mod key;
mod memory;

pub use fs::FsStore;
pub use key::{StoreKey, META_SENTINEL};
pub use memory::MemoryStore;

use anyhow::Result;

/// A record-namespace listing entry: key name plus integrity tag
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// Record key name (a durable session identifier)
    pub name: String,

    /// Cheap content fingerprint (write generation in memory,
    /// size + mtime on disk)
    pub etag: String,
}

/// Contract for the durable key/value store
///
/// `put_if_absent` is the primitive the identifier allocator builds on: it
/// must be atomic with respect to concurrent calls for the same key.
#[async_trait::async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Fetch the value stored under `key`, if any
    async fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>>;

    /// Write `value` under `key`, overwriting any previous value
    async fn put(&self, key: &StoreKey, value: &[u8]) -> Result<()>;

    /// Write `value` under `key` only if the key does not exist yet.
    /// Returns false (and writes nothing) if the key was already present.
    async fn put_if_absent(&self, key: &StoreKey, value: &[u8]) -> Result<bool>;

    /// List record-namespace entries, optionally filtered by name prefix.
    /// Meta keys are never returned.
    async fn list(&self, prefix: Option<&str>) -> Result<Vec<StoreEntry>>;
}
