//! Read-mostly shared handle over the store.
//!
//! Readers take a cheap `Arc` snapshot and search without holding any lock.
//! A rebuild constructs a complete replacement store, persists it, then swaps
//! the `Arc` in one write — in-flight readers keep their old snapshot and
//! never observe a half-updated mapping.

use std::path::Path;
use std::sync::Arc;

use encoder::Encoder;
use parking_lot::RwLock;

use crate::bulk::{BulkReport, embed_and_store};
use crate::error::Result;
use crate::store::EmbeddingStore;

/// Concurrent access point for serving searches while rebuilds happen.
#[derive(Debug, Default)]
pub struct SharedIndex {
    current: RwLock<Arc<EmbeddingStore>>,
}

impl SharedIndex {
    pub fn new(store: EmbeddingStore) -> Self {
        Self {
            current: RwLock::new(Arc::new(store)),
        }
    }

    /// Load the persisted store into a fresh handle.
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(EmbeddingStore::load(path)?))
    }

    /// Snapshot for lock-free searching.
    pub fn snapshot(&self) -> Arc<EmbeddingStore> {
        self.current.read().clone()
    }

    /// Swap in a fully built replacement store.
    pub fn replace(&self, store: EmbeddingStore) {
        *self.current.write() = Arc::new(store);
    }

    /// Re-embed `dir`, persist to `store_path`, then swap the served mapping.
    pub fn rebuild(
        &self,
        encoder: &dyn Encoder,
        dir: &Path,
        store_path: &Path,
    ) -> Result<BulkReport> {
        let (store, report) = embed_and_store(encoder, dir, store_path)?;
        self.replace(store);
        Ok(report)
    }
}
