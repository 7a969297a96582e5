//! File-backed storage: one JSON document per key in a data directory

use async_trait::async_trait;
use std::fs;
use std::path::{Path, PathBuf};

use crate::traits::*;
use crate::types::*;

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed
    pub fn open(dir: impl AsRef<Path>) -> LedgerResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|e| {
            LedgerError::Storage(format!("Failed to create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> LedgerResult<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(LedgerError::Storage(format!(
                "Key '{}' is not a valid file name",
                key
            )));
        }
        Ok(self.dir.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl EntryStore for FileStore {
    async fn load(&self, key: &str) -> LedgerResult<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)?;
        Ok(Some(contents))
    }

    async fn save(&mut self, key: &str, value: &str) -> LedgerResult<()> {
        let path = self.path_for(key)?;
        let staging = path.with_extension("json.tmp");

        // Readers never observe a half-written document
        fs::write(&staging, value)?;
        fs::rename(&staging, &path)?;

        log::debug!("Wrote {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("ledger")).unwrap();

        assert!(store.load("herbEntries").await.unwrap().is_none());
        store.save("herbEntries", "[1]").await.unwrap();
        store.save("herbEntries", "[1,2]").await.unwrap();

        let reopened = FileStore::open(store.dir()).unwrap();
        assert_eq!(
            reopened.load("herbEntries").await.unwrap().as_deref(),
            Some("[1,2]")
        );
        assert!(!store.dir().join("herbEntries.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        assert!(store.save("../escape", "x").await.is_err());
        assert!(store.load("").await.is_err());
    }
}
