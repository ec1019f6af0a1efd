//! Artifact orchestration service
//!
//! [`ShadowTwinStore`] is the façade the rest of the system consumes. It owns
//! the primary/fallback backend choice (made once at construction, never
//! re-branched per call), applies the superset rule, enforces the non-empty
//! write invariant a second time, and composes the fragment pipeline with
//! metadata patches.

use crate::backend::{ArtifactBackend, WriteContext, WriteReceipt, reject_empty_markdown};
use crate::config::{BackendSelection, SourceRef, StoreConfig};
use crate::error::StoreError;
use crate::fragments::{FragmentPipeline, Thumbnailer};
use crate::naming;
use serde_yaml::Mapping;
use std::sync::Arc;
use twin_artifact::{
    frontmatter, ArtifactId, ArtifactKey, ArtifactKind, ArtifactRecord, BinaryFragment,
    ContentHash, FragmentKind, FragmentVariant,
};

/// Result of a frontmatter patch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchOutcome {
    /// The artifact's full markdown after the patch
    pub markdown: String,
    /// Backend-native id of the written artifact
    pub id: String,
}

/// Result of a cover-image upload
#[derive(Debug, Clone)]
pub struct CoverImageOutcome {
    /// The uploaded original fragment
    pub original: BinaryFragment,
    /// The derived thumbnail, when derivation succeeded
    pub thumbnail: Option<BinaryFragment>,
    /// The patched artifact markdown
    pub markdown: String,
    /// Backend-native id of the patched artifact
    pub id: String,
}

/// The shadow-twin store façade, bound to one source document
pub struct ShadowTwinStore {
    source: SourceRef,
    primary: Arc<dyn ArtifactBackend>,
    fallback: Option<Arc<dyn ArtifactBackend>>,
    dual_persist: bool,
    pipeline: FragmentPipeline,
}

impl ShadowTwinStore {
    /// Assemble a store from explicit backends
    ///
    /// `fallback` must not be the same backend as `primary`; pass `None` when
    /// configuration disallows a fallback.
    pub fn new(
        source: SourceRef,
        primary: Arc<dyn ArtifactBackend>,
        fallback: Option<Arc<dyn ArtifactBackend>>,
        dual_persist: bool,
        thumbnailer: Arc<dyn Thumbnailer>,
    ) -> Self {
        let pipeline =
            FragmentPipeline::new(primary.clone(), source.source_id.clone(), thumbnailer);
        Self {
            source,
            primary,
            fallback,
            dual_persist,
            pipeline,
        }
    }

    /// Select primary and fallback per configuration
    ///
    /// Exactly one of the two backends becomes primary; the other becomes the
    /// fallback only when configuration allows it. `dual_persist` has no
    /// effect without a fallback.
    pub fn from_config(
        config: &StoreConfig,
        source: SourceRef,
        document_store: Arc<dyn ArtifactBackend>,
        drive: Arc<dyn ArtifactBackend>,
        thumbnailer: Arc<dyn Thumbnailer>,
    ) -> Self {
        let (primary, other) = match config.primary_backend {
            BackendSelection::DocumentStore => (document_store, drive),
            BackendSelection::Drive => (drive, document_store),
        };
        let fallback = config.allow_fallback.then_some(other);
        Self::new(
            source,
            primary,
            fallback,
            config.dual_persist,
            thumbnailer,
        )
    }

    /// The source this store serves
    #[inline]
    #[must_use]
    pub fn source(&self) -> &SourceRef {
        &self.source
    }

    /// Whether an artifact exists
    ///
    /// Search order is the defining algorithm of this service: direct check,
    /// then the superset check, first against the primary, then against the
    /// fallback, short-circuiting on the first hit. The superset rule: a
    /// transformation subsumes its transcript, so a transcript existence
    /// check with `include_supersets` also accepts a transformation for the
    /// same language (narrowed to one template when the caller names it).
    pub async fn exists(
        &self,
        kind: ArtifactKind,
        target_language: &str,
        template_name: Option<&str>,
        include_supersets: bool,
    ) -> Result<bool, StoreError> {
        let key = self.key(kind, target_language, template_name);
        let superset_applies = include_supersets && kind == ArtifactKind::Transcript;

        let superset = superset_applies
            .then(|| self.key(ArtifactKind::Transformation, target_language, template_name));
        for backend in self.backends() {
            if backend.exists(&key).await? {
                return Ok(true);
            }
            if let Some(superset) = &superset {
                if backend.exists(superset).await? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Read an artifact, primary then fallback
    ///
    /// No superset substitution here: a transcript read stays a transcript
    /// read, so callers never silently receive the wrong document kind.
    pub async fn get_markdown(
        &self,
        kind: ArtifactKind,
        target_language: &str,
        template_name: Option<&str>,
    ) -> Result<Option<ArtifactRecord>, StoreError> {
        let key = self.key(kind, target_language, template_name);
        self.read_any(&key).await
    }

    /// Create or replace an artifact
    ///
    /// The primary write is authoritative. With dual persistence enabled the
    /// fallback is mirrored best-effort; its failure is logged and swallowed.
    pub async fn upsert_markdown(
        &self,
        kind: ArtifactKind,
        target_language: &str,
        template_name: Option<&str>,
        markdown: &str,
    ) -> Result<WriteReceipt, StoreError> {
        let key = self.key(kind, target_language, template_name);
        // Defense in depth: backends check too, but they may be invoked
        // directly elsewhere.
        reject_empty_markdown(&key, markdown)?;

        let receipt = self.write_all(&key, markdown).await?;
        tracing::info!(key = %key, id = %receipt.id, "artifact upserted");
        Ok(receipt)
    }

    /// Resolve an artifact's id and validate it against the expected contract
    ///
    /// The decoded id must carry the expected kind (and, for transformations
    /// with a template supplied, a case-insensitively matching template).
    /// Drive-native handles do not decode and cannot prove the contract, so
    /// they resolve to `None`. Callers persisting ids for later dereference
    /// only ever receive ids this validation vouches for.
    pub async fn resolve_saved_item_id(
        &self,
        expected_kind: ArtifactKind,
        target_language: &str,
        template_name: Option<&str>,
    ) -> Result<Option<ArtifactId>, StoreError> {
        let Some(record) = self
            .get_markdown(expected_kind, target_language, template_name)
            .await?
        else {
            return Ok(None);
        };

        let Ok(id) = ArtifactId::parse(&record.id) else {
            tracing::debug!(id = %record.id, "record id is not a codec id, cannot validate");
            return Ok(None);
        };
        let (_, decoded) = id.decode()?;

        if decoded.kind != expected_kind {
            tracing::warn!(
                id = %record.id,
                expected = %expected_kind,
                actual = %decoded.kind,
                "resolved id fails kind validation"
            );
            return Ok(None);
        }
        if expected_kind == ArtifactKind::Transformation {
            if let Some(wanted) = template_name {
                match decoded.template_name.as_deref() {
                    Some(actual) if actual.eq_ignore_ascii_case(wanted) => {}
                    _ => return Ok(None),
                }
            }
        }
        Ok(Some(id))
    }

    /// Read-modify-write over an artifact's metadata
    ///
    /// The body is preserved byte-for-byte. A template-less transformation
    /// patch first resolves the existing artifact (most-recent rule) and must
    /// recover its template before writing; proceeding with an unknown
    /// template would risk patching the wrong document.
    pub async fn patch_frontmatter(
        &self,
        kind: ArtifactKind,
        target_language: &str,
        template_name: Option<&str>,
        patches: &Mapping,
    ) -> Result<PatchOutcome, StoreError> {
        let read_key = self.key(kind, target_language, template_name);
        let record = self
            .read_any(&read_key)
            .await?
            .ok_or_else(|| StoreError::NotFound(read_key.to_string()))?;

        let write_key = if kind == ArtifactKind::Transformation && template_name.is_none() {
            let template = Self::recover_template(&record).ok_or_else(|| {
                StoreError::AmbiguousTemplate(format!(
                    "cannot determine template for {read_key}"
                ))
            })?;
            self.key(kind, target_language, Some(&template))
        } else {
            read_key
        };

        let markdown = frontmatter::patch(&record.markdown, patches)?;
        let receipt = self.write_all(&write_key, &markdown).await?;
        tracing::debug!(key = %write_key, "frontmatter patched");
        Ok(PatchOutcome {
            markdown,
            id: receipt.id,
        })
    }

    /// Upload a binary fragment (dedup by content hash)
    pub async fn upload_fragment(
        &self,
        bytes: &[u8],
        name: &str,
        mime_type: &str,
        kind: FragmentKind,
        variant: FragmentVariant,
        source_hash: Option<ContentHash>,
    ) -> Result<BinaryFragment, StoreError> {
        self.pipeline
            .upload_fragment(bytes, name, mime_type, kind, variant, source_hash)
            .await
    }

    /// Upload a cover image, derive its thumbnail, and patch both locators
    /// into the artifact's frontmatter
    ///
    /// Thumbnail failure is non-fatal: the original upload and the metadata
    /// patch still succeed.
    pub async fn upload_cover_image_and_patch(
        &self,
        bytes: &[u8],
        name: &str,
        mime_type: &str,
        kind: ArtifactKind,
        target_language: &str,
        template_name: Option<&str>,
    ) -> Result<CoverImageOutcome, StoreError> {
        let (original, thumbnail) = self
            .pipeline
            .upload_image_with_thumbnail(bytes, name, mime_type)
            .await?;

        let mut patches = Mapping::new();
        patches.insert("cover_image".into(), original.locator.to_string().into());
        if let Some(thumb) = &thumbnail {
            patches.insert(
                "cover_image_thumbnail".into(),
                thumb.locator.to_string().into(),
            );
        }

        let outcome = self
            .patch_frontmatter(kind, target_language, template_name, &patches)
            .await?;
        tracing::info!(
            source = %self.source.source_id,
            hash = %original.hash.short(),
            thumbnail = thumbnail.is_some(),
            "cover image stored"
        );
        Ok(CoverImageOutcome {
            original,
            thumbnail,
            markdown: outcome.markdown,
            id: outcome.id,
        })
    }

    /// Build the key for one operation argument set
    ///
    /// Transcripts are never persisted with a template, so a supplied template
    /// is dropped for transcript keys; keeping it would produce a key no write
    /// ever creates and make a live transcript unresolvable.
    fn key(
        &self,
        kind: ArtifactKind,
        target_language: &str,
        template_name: Option<&str>,
    ) -> ArtifactKey {
        let template_name = match kind {
            ArtifactKind::Transcript => None,
            ArtifactKind::Transformation => template_name.map(str::to_string),
        };
        ArtifactKey {
            source_id: self.source.source_id.clone(),
            kind,
            target_language: target_language.to_string(),
            template_name,
        }
    }

    fn backends(&self) -> impl Iterator<Item = &Arc<dyn ArtifactBackend>> {
        std::iter::once(&self.primary).chain(self.fallback.as_ref())
    }

    fn write_context(&self) -> WriteContext {
        WriteContext {
            source_name: self.source.source_name.clone(),
        }
    }

    async fn read_any(&self, key: &ArtifactKey) -> Result<Option<ArtifactRecord>, StoreError> {
        for backend in self.backends() {
            match backend.read(key).await {
                Ok(record) => return Ok(Some(record)),
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    async fn write_all(
        &self,
        key: &ArtifactKey,
        markdown: &str,
    ) -> Result<WriteReceipt, StoreError> {
        let ctx = self.write_context();
        let receipt = self.primary.write(key, markdown, &ctx).await?;

        if self.dual_persist {
            if let Some(fallback) = &self.fallback {
                if let Err(e) = fallback.write(key, markdown, &ctx).await {
                    // Best-effort mirror: the primary write already defines
                    // success. The log keeps the failure observable.
                    tracing::warn!(
                        key = %key,
                        error = %e,
                        "fallback write failed, primary write is authoritative"
                    );
                }
            }
        }
        Ok(receipt)
    }

    /// Recover a transformation's template from its record
    ///
    /// Codec ids carry it directly; drive records carry it in the
    /// conventional file name.
    fn recover_template(record: &ArtifactRecord) -> Option<String> {
        if let Ok(id) = ArtifactId::parse(&record.id) {
            if let Ok((_, key)) = id.decode() {
                if key.template_name.is_some() {
                    return key.template_name;
                }
            }
        }
        naming::parse_artifact_file_name(&record.name).and_then(|parsed| parsed.template_name)
    }
}
