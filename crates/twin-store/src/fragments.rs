//! Binary fragment pipeline
//!
//! Content-hash dedup, upload, and derived-thumbnail generation. The pipeline
//! always targets the primary backend; dedup is by listing the source's
//! fragments and matching hash + variant, so it is an optimization, not a
//! uniqueness guarantee: a concurrent upload of the same new hash may create
//! a harmless duplicate record, never corrupt data.

use crate::backend::{ArtifactBackend, FragmentUpload};
use crate::error::StoreError;
use std::sync::Arc;
use twin_artifact::{BinaryFragment, ContentHash, FragmentKind, FragmentVariant};

/// A derived image produced by a [`Thumbnailer`]
#[derive(Debug, Clone)]
pub struct DerivedImage {
    /// Encoded image bytes
    pub bytes: Vec<u8>,
    /// MIME type of the derived bytes
    pub mime_type: String,
}

/// Pure thumbnail derivation, consumed as an external collaborator
///
/// Implementations resize/re-encode a source image buffer; pixel-level work is
/// out of scope for the store itself.
pub trait Thumbnailer: Send + Sync {
    /// Derive a fixed-size thumbnail from an original image buffer
    ///
    /// # Errors
    /// Returns [`ThumbnailError`] when the input cannot be processed. The
    /// caller treats this as non-fatal.
    fn derive(&self, bytes: &[u8], mime_type: &str) -> Result<DerivedImage, ThumbnailError>;
}

/// Thumbnail derivation errors
#[derive(Debug, thiserror::Error)]
pub enum ThumbnailError {
    /// Input format not supported
    #[error("unsupported image format: {0}")]
    Unsupported(String),

    /// Decoding or resizing failed
    #[error("thumbnail derivation failed: {0}")]
    Failed(String),
}

/// A [`Thumbnailer`] that derives nothing
///
/// For deployments without image tooling; every image is stored with its
/// original only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoThumbnailer;

impl Thumbnailer for NoThumbnailer {
    fn derive(&self, _bytes: &[u8], mime_type: &str) -> Result<DerivedImage, ThumbnailError> {
        Err(ThumbnailError::Unsupported(mime_type.to_string()))
    }
}

/// Upload pipeline bound to one source document and one backend
#[derive(Clone)]
pub struct FragmentPipeline {
    backend: Arc<dyn ArtifactBackend>,
    source_id: String,
    thumbnailer: Arc<dyn Thumbnailer>,
}

impl FragmentPipeline {
    /// Create a pipeline for a source
    #[inline]
    pub fn new(
        backend: Arc<dyn ArtifactBackend>,
        source_id: impl Into<String>,
        thumbnailer: Arc<dyn Thumbnailer>,
    ) -> Self {
        Self {
            backend,
            source_id: source_id.into(),
            thumbnailer,
        }
    }

    /// Upload bytes as a fragment, deduplicating by content hash
    ///
    /// Identical bytes with the same variant resolve to the existing fragment;
    /// no second upload occurs.
    pub async fn upload_fragment(
        &self,
        bytes: &[u8],
        name: &str,
        mime_type: &str,
        kind: FragmentKind,
        variant: FragmentVariant,
        source_hash: Option<ContentHash>,
    ) -> Result<BinaryFragment, StoreError> {
        let hash = ContentHash::compute(bytes);

        let existing = match self.backend.list_binary_fragments(&self.source_id).await {
            Ok(fragments) => fragments,
            // A source without a fragment area yet simply has nothing to dedup
            // against.
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };
        if let Some(found) = existing
            .into_iter()
            .find(|f| f.hash == hash && f.variant == variant)
        {
            tracing::debug!(
                source = %self.source_id,
                hash = %hash.short(),
                "fragment already stored, reusing locator"
            );
            return Ok(found);
        }

        self.backend
            .put_binary_fragment(
                &self.source_id,
                FragmentUpload {
                    name,
                    bytes,
                    mime_type,
                    kind,
                    variant,
                    hash,
                    source_hash,
                },
            )
            .await
    }

    /// Upload an image original plus a best-effort thumbnail
    ///
    /// Thumbnail derivation or upload failure is logged and never fails the
    /// operation; the original is authoritative.
    pub async fn upload_image_with_thumbnail(
        &self,
        bytes: &[u8],
        name: &str,
        mime_type: &str,
    ) -> Result<(BinaryFragment, Option<BinaryFragment>), StoreError> {
        let original = self
            .upload_fragment(
                bytes,
                name,
                mime_type,
                FragmentKind::Image,
                FragmentVariant::Original,
                None,
            )
            .await?;

        let thumbnail = match self.thumbnailer.derive(bytes, mime_type) {
            Ok(derived) => {
                let thumb_name = format!("thumb-{name}");
                match self
                    .upload_fragment(
                        &derived.bytes,
                        &thumb_name,
                        &derived.mime_type,
                        FragmentKind::Image,
                        FragmentVariant::Thumbnail,
                        Some(original.hash),
                    )
                    .await
                {
                    Ok(thumb) => Some(thumb),
                    Err(e) => {
                        tracing::warn!(
                            source = %self.source_id,
                            error = %e,
                            "thumbnail upload failed, continuing with original only"
                        );
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    source = %self.source_id,
                    error = %e,
                    "thumbnail derivation failed, continuing with original only"
                );
                None
            }
        };

        Ok((original, thumbnail))
    }

    /// The source this pipeline is bound to
    #[inline]
    #[must_use]
    pub fn source_id(&self) -> &str {
        &self.source_id
    }
}
