//! Document collection port
//!
//! The document-store backend talks to its database through this trait only.
//! Implementations are index-able key/value document collections (the
//! in-memory [`super::MemoryCollection`] ships in-crate; real deployments
//! provide their own).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use twin_artifact::{ArtifactKind, BinaryFragment};

/// A stored artifact document
///
/// Key fields are denormalized next to the text so `find_by_source` can filter
/// without decoding ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Encoded artifact id, the collection key
    pub id: String,
    /// Source document this artifact derives from
    pub source_id: String,
    /// Artifact category
    pub kind: ArtifactKind,
    /// Target language code
    pub target_language: String,
    /// Template for transformations
    pub template_name: Option<String>,
    /// Display name
    pub name: String,
    /// Full markdown text, frontmatter included
    pub markdown: String,
    /// Last write time, set by the backend on every upsert
    pub updated_at: DateTime<Utc>,
}

/// A stored fragment record
///
/// Bytes are optional so a collection can hold references to externally
/// stored blobs as well as the blobs themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFragment {
    /// Source document the fragment belongs to
    pub source_id: String,
    /// Fragment metadata
    pub fragment: BinaryFragment,
    /// The bytes, when this collection holds them
    pub bytes: Option<Vec<u8>>,
}

/// Index-able document collection contract
#[async_trait::async_trait]
pub trait DocumentCollection: Send + Sync {
    /// Fetch a document by its collection key
    async fn get(&self, id: &str) -> Result<Option<StoredDocument>, CollectionError>;

    /// Create or replace a document
    async fn upsert(&self, doc: StoredDocument) -> Result<(), CollectionError>;

    /// Remove a document; returns whether it existed
    async fn delete(&self, id: &str) -> Result<bool, CollectionError>;

    /// All artifact documents for a source
    async fn find_by_source(&self, source_id: &str) -> Result<Vec<StoredDocument>, CollectionError>;

    /// Register a fragment record
    async fn put_fragment(&self, fragment: StoredFragment) -> Result<(), CollectionError>;

    /// All fragment records for a source
    async fn fragments_for_source(
        &self,
        source_id: &str,
    ) -> Result<Vec<StoredFragment>, CollectionError>;
}

/// Collection transport errors
#[derive(Debug, thiserror::Error)]
pub enum CollectionError {
    /// The collection cannot be reached
    #[error("collection unavailable: {0}")]
    Unavailable(String),
}

impl From<CollectionError> for crate::error::StoreError {
    fn from(err: CollectionError) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}
