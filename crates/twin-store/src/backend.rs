//! Backend store contract
//!
//! [`ArtifactBackend`] is implemented once per backend; the orchestration layer
//! selects primary and fallback at construction time and never branches on the
//! backend kind per call.

use crate::error::StoreError;
use twin_artifact::{
    ArtifactKey, ArtifactRecord, BinaryFragment, ContentHash, FragmentKind, FragmentVariant,
};

/// Caller-supplied context for a write
///
/// Binary fragments have their own channel ([`ArtifactBackend::put_binary_fragment`]);
/// this context only carries per-write presentation data.
#[derive(Debug, Clone, Default)]
pub struct WriteContext {
    /// Display name of the source document, used for derived artifact names
    pub source_name: Option<String>,
}

impl WriteContext {
    /// Context carrying a source display name
    #[inline]
    #[must_use]
    pub fn named(source_name: impl Into<String>) -> Self {
        Self {
            source_name: Some(source_name.into()),
        }
    }
}

/// What a successful write hands back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReceipt {
    /// Backend-native id of the written artifact
    pub id: String,
    /// Name the artifact was stored under
    pub name: String,
}

/// A fragment upload request
#[derive(Debug, Clone, Copy)]
pub struct FragmentUpload<'a> {
    /// Display name (usually the file name)
    pub name: &'a str,
    /// The bytes to store
    pub bytes: &'a [u8],
    /// MIME type of the bytes
    pub mime_type: &'a str,
    /// Media category
    pub kind: FragmentKind,
    /// Role relative to the original bytes
    pub variant: FragmentVariant,
    /// Content hash, precomputed by the pipeline
    pub hash: ContentHash,
    /// Hash of the original for derived variants
    pub source_hash: Option<ContentHash>,
}

/// The polymorphic backend contract
///
/// # Contract
/// - `write` must reject empty/whitespace-only markdown with
///   [`StoreError::EmptyContent`] before any I/O, and a template-less
///   transformation key with [`StoreError::AmbiguousTemplate`].
/// - A transformation read key with `template_name = None` resolves to the
///   most recently updated matching artifact; equal timestamps break to the
///   lexicographically smallest template name.
/// - `read` returns [`StoreError::NotFound`] when the key has no artifact.
#[async_trait::async_trait]
pub trait ArtifactBackend: Send + Sync {
    /// Whether an artifact exists for this key
    async fn exists(&self, key: &ArtifactKey) -> Result<bool, StoreError>;

    /// Read the artifact for this key
    async fn read(&self, key: &ArtifactKey) -> Result<ArtifactRecord, StoreError>;

    /// Create or replace the artifact for this key
    async fn write(
        &self,
        key: &ArtifactKey,
        markdown: &str,
        ctx: &WriteContext,
    ) -> Result<WriteReceipt, StoreError>;

    /// List the binary fragments stored for a source document
    async fn list_binary_fragments(
        &self,
        source_id: &str,
    ) -> Result<Vec<BinaryFragment>, StoreError>;

    /// Store a binary fragment for a source document
    ///
    /// Dedup by hash is the pipeline's concern; backends store what they are
    /// given.
    async fn put_binary_fragment(
        &self,
        source_id: &str,
        upload: FragmentUpload<'_>,
    ) -> Result<BinaryFragment, StoreError>;
}

/// Most-recent selection shared by both backends for template-less
/// transformation reads: newest `updated_at` wins, equal timestamps break to
/// the lexicographically smallest template name. Total and deterministic.
pub(crate) fn select_latest<T>(
    mut items: Vec<T>,
    updated_at: impl Fn(&T) -> chrono::DateTime<chrono::Utc>,
    template: impl Fn(&T) -> String,
) -> Option<T> {
    items.sort_by(|a, b| {
        updated_at(b)
            .cmp(&updated_at(a))
            .then_with(|| template(a).cmp(&template(b)))
    });
    items.into_iter().next()
}

/// Guard shared by every backend and re-applied by the orchestration layer.
///
/// Rejecting before any I/O protects every downstream reader from treating a
/// zero-byte artifact as valid.
pub fn reject_empty_markdown(key: &ArtifactKey, markdown: &str) -> Result<(), StoreError> {
    if markdown.trim().is_empty() {
        return Err(StoreError::EmptyContent(key.to_string()));
    }
    Ok(())
}
