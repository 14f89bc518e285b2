use super::{StoreEntry, StoreKey, TranscriptStore, META_SENTINEL};
use anyhow::{Context, Result};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Filesystem store backend: one `<key>.json` file per entry
///
/// The conditional put relies on `O_EXCL` (`create_new`), so the allocation
/// reservation holds across processes sharing the same directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    /// Open (and create if needed) a store rooted at `root`
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create store directory {}", root.display()))?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &StoreKey) -> PathBuf {
        self.root.join(format!("{}.json", key.name()))
    }

    fn etag_for(path: &Path) -> Result<String> {
        let meta = fs::metadata(path)
            .with_context(|| format!("Failed to stat {}", path.display()))?;
        let mtime_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis())
            .unwrap_or(0);
        Ok(format!("{}-{}", meta.len(), mtime_ms))
    }
}

#[async_trait::async_trait]
impl TranscriptStore for FsStore {
    async fn get(&self, key: &StoreKey) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn put(&self, key: &StoreKey, value: &[u8]) -> Result<()> {
        let path = self.path_for(key);
        tokio::fs::write(&path, value)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))
    }

    async fn put_if_absent(&self, key: &StoreKey, value: &[u8]) -> Result<bool> {
        let path = self.path_for(key);
        // create_new gives the atomic exists-check + create in one syscall
        let file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path);
        match file {
            Ok(mut f) => {
                use std::io::Write;
                f.write_all(value)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to create {}", path.display())),
        }
    }

    async fn list(&self, prefix: Option<&str>) -> Result<Vec<StoreEntry>> {
        let mut out = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.root)
            .await
            .with_context(|| format!("Failed to list {}", self.root.display()))?;

        while let Some(entry) = dir.next_entry().await? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            if name.starts_with(META_SENTINEL) {
                continue;
            }
            if let Some(p) = prefix {
                if !name.starts_with(p) {
                    continue;
                }
            }
            out.push(StoreEntry {
                name: name.to_string(),
                etag: Self::etag_for(&entry.path())?,
            });
        }

        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }
}
