use super::{provisional_id, DatePrefix};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing::warn;

/// Persisted day/counter pair backing provisional identifiers
#[derive(Debug, Clone, Serialize, Deserialize)]
struct DayCounter {
    date: String,
    counter: u32,
}

/// Generates provisional session identifiers from a daily counter
///
/// The counter continues within a day and resets to 1 when the stored date
/// differs from today, so identifiers stay sequential across restarts. The
/// state is local to the client and never shared with the server.
pub struct ProvisionalIdSource {
    path: Option<PathBuf>,
    state: Option<DayCounter>,
}

impl ProvisionalIdSource {
    /// Counter kept only in memory (resets on every construction)
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: None,
        }
    }

    /// Counter persisted as JSON at `path`, loaded if present.
    /// Unreadable state is discarded and the counter starts fresh.
    pub fn with_state_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let state = match fs::read(&path) {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(state) => Some(state),
                Err(e) => {
                    warn!("Discarding unreadable counter state at {}: {}", path.display(), e);
                    None
                }
            },
            Err(_) => None,
        };
        Self {
            path: Some(path),
            state,
        }
    }

    /// Next provisional identifier for today's date
    pub fn next(&mut self) -> Result<String> {
        self.next_for(&DatePrefix::today())
    }

    /// Next provisional identifier for an explicit date prefix
    pub fn next_for(&mut self, prefix: &DatePrefix) -> Result<String> {
        let counter = match &self.state {
            Some(state) if state.date == prefix.as_str() => state.counter + 1,
            _ => 1,
        };

        self.state = Some(DayCounter {
            date: prefix.as_str().to_string(),
            counter,
        });
        self.persist()?;

        Ok(provisional_id(prefix, counter))
    }

    fn persist(&self) -> Result<()> {
        let (Some(path), Some(state)) = (&self.path, &self.state) else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let bytes = serde_json::to_vec_pretty(state)?;
        fs::write(path, bytes)
            .with_context(|| format!("Failed to write counter state {}", path.display()))
    }
}
