//! In-memory document collection
//!
//! DashMap-backed [`DocumentCollection`] used by tests and single-process
//! deployments. Infallible by construction; the trait's error type exists for
//! networked implementations.

use crate::document::collection::{CollectionError, DocumentCollection, StoredDocument, StoredFragment};
use dashmap::DashMap;

/// In-memory, concurrent document collection
#[derive(Debug, Default)]
pub struct MemoryCollection {
    docs: DashMap<String, StoredDocument>,
    fragments: DashMap<String, Vec<StoredFragment>>,
}

impl MemoryCollection {
    /// Create an empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored documents
    #[inline]
    #[must_use]
    pub fn document_count(&self) -> usize {
        self.docs.len()
    }
}

#[async_trait::async_trait]
impl DocumentCollection for MemoryCollection {
    async fn get(&self, id: &str) -> Result<Option<StoredDocument>, CollectionError> {
        Ok(self.docs.get(id).map(|entry| entry.clone()))
    }

    async fn upsert(&self, doc: StoredDocument) -> Result<(), CollectionError> {
        self.docs.insert(doc.id.clone(), doc);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<bool, CollectionError> {
        Ok(self.docs.remove(id).is_some())
    }

    async fn find_by_source(
        &self,
        source_id: &str,
    ) -> Result<Vec<StoredDocument>, CollectionError> {
        Ok(self
            .docs
            .iter()
            .filter(|entry| entry.source_id == source_id)
            .map(|entry| entry.clone())
            .collect())
    }

    async fn put_fragment(&self, fragment: StoredFragment) -> Result<(), CollectionError> {
        self.fragments
            .entry(fragment.source_id.clone())
            .or_default()
            .push(fragment);
        Ok(())
    }

    async fn fragments_for_source(
        &self,
        source_id: &str,
    ) -> Result<Vec<StoredFragment>, CollectionError> {
        Ok(self
            .fragments
            .get(source_id)
            .map(|entry| entry.clone())
            .unwrap_or_default())
    }
}
