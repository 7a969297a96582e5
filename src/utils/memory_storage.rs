//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::traits::*;
use crate::types::*;

/// In-memory blob store for testing and development
///
/// Clones share the same map, so a test can hand one clone to a registry and
/// later open a second registry over another clone to simulate a cold start.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    blobs: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    /// Create an empty memory store
    pub fn new() -> Self {
        Self {
            blobs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a store pre-seeded with one blob
    pub fn with_blob(key: &str, value: &str) -> Self {
        let store = Self::new();
        if let Ok(mut blobs) = store.blobs.write() {
            blobs.insert(key.to_string(), value.to_string());
        }
        store
    }

    /// Clear all data (useful for testing)
    pub fn clear(&self) -> LedgerResult<()> {
        self.blobs
            .write()
            .map_err(|_| LedgerError::Storage("Memory store lock poisoned".to_string()))?
            .clear();
        Ok(())
    }

    /// Number of keys held
    pub fn len(&self) -> usize {
        self.blobs.read().map(|blobs| blobs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn load(&self, key: &str) -> LedgerResult<Option<String>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| LedgerError::Storage("Memory store lock poisoned".to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    async fn save(&mut self, key: &str, value: &str) -> LedgerResult<()> {
        self.blobs
            .write()
            .map_err(|_| LedgerError::Storage("Memory store lock poisoned".to_string()))?
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}
