//! Document-store backend
//!
//! Looks artifacts up directly by their encoded [`ArtifactId`] (no scan). The
//! only fan-out is the template-less transformation read, which loads the
//! source's transformation variants and selects the most recently updated one.

use crate::backend::{
    select_latest, ArtifactBackend, FragmentUpload, WriteContext, WriteReceipt,
    reject_empty_markdown,
};
use crate::document::collection::{DocumentCollection, StoredDocument, StoredFragment};
use crate::error::StoreError;
use chrono::Utc;
use std::sync::Arc;
use twin_artifact::{
    frontmatter, ArtifactId, ArtifactKey, ArtifactKind, ArtifactRecord, BinaryFragment,
    FragmentLocator,
};

/// Backend over an index-able document collection
#[derive(Clone)]
pub struct DocStoreBackend {
    namespace: String,
    collection: Arc<dyn DocumentCollection>,
}

impl DocStoreBackend {
    /// Create a backend bound to a namespace
    ///
    /// The namespace is baked into every encoded id, so two tenants sharing a
    /// collection never collide.
    #[inline]
    pub fn new(namespace: impl Into<String>, collection: Arc<dyn DocumentCollection>) -> Self {
        Self {
            namespace: namespace.into(),
            collection,
        }
    }

    /// Namespace this backend encodes into ids
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn resolve_doc(&self, key: &ArtifactKey) -> Result<StoredDocument, StoreError> {
        if key.kind == ArtifactKind::Transformation && key.template_name.is_none() {
            // Fan out: all transformation variants for the source, filtered by
            // language, most recent wins.
            let mut candidates = self.collection.find_by_source(&key.source_id).await?;
            candidates.retain(|doc| {
                doc.kind == ArtifactKind::Transformation
                    && doc.target_language == key.target_language
            });
            return select_latest(
                candidates,
                |doc| doc.updated_at,
                |doc| doc.template_name.clone().unwrap_or_default(),
            )
            .ok_or_else(|| StoreError::NotFound(key.to_string()));
        }

        let id = ArtifactId::encode(&self.namespace, key);
        self.collection
            .get(id.as_str())
            .await?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn display_name(&self, key: &ArtifactKey, ctx: &WriteContext) -> String {
        let source = ctx
            .source_name
            .clone()
            .unwrap_or_else(|| key.source_id.clone());
        match key.template_name.as_deref() {
            Some(template) => format!("{source} – {template} ({})", key.target_language),
            None => format!("{source} – {} ({})", key.kind, key.target_language),
        }
    }
}

#[async_trait::async_trait]
impl ArtifactBackend for DocStoreBackend {
    async fn exists(&self, key: &ArtifactKey) -> Result<bool, StoreError> {
        match self.resolve_doc(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn read(&self, key: &ArtifactKey) -> Result<ArtifactRecord, StoreError> {
        let doc = self.resolve_doc(key).await?;
        let (metadata, _) = frontmatter::parse(&doc.markdown);
        Ok(ArtifactRecord {
            id: doc.id,
            name: doc.name,
            markdown: doc.markdown,
            frontmatter: metadata,
        })
    }

    async fn write(
        &self,
        key: &ArtifactKey,
        markdown: &str,
        ctx: &WriteContext,
    ) -> Result<WriteReceipt, StoreError> {
        reject_empty_markdown(key, markdown)?;
        key.require_template()?;

        let id = ArtifactId::encode(&self.namespace, key);
        let name = self.display_name(key, ctx);
        let doc = StoredDocument {
            id: id.as_str().to_string(),
            source_id: key.source_id.clone(),
            kind: key.kind,
            target_language: key.target_language.clone(),
            template_name: key.template_name.clone(),
            name: name.clone(),
            markdown: markdown.to_string(),
            updated_at: Utc::now(),
        };
        self.collection.upsert(doc).await?;

        tracing::debug!(id = %id, source = %key.source_id, "document-store write");
        Ok(WriteReceipt {
            id: id.as_str().to_string(),
            name,
        })
    }

    async fn list_binary_fragments(
        &self,
        source_id: &str,
    ) -> Result<Vec<BinaryFragment>, StoreError> {
        let stored = self.collection.fragments_for_source(source_id).await?;
        Ok(stored.into_iter().map(|sf| sf.fragment).collect())
    }

    async fn put_binary_fragment(
        &self,
        source_id: &str,
        upload: FragmentUpload<'_>,
    ) -> Result<BinaryFragment, StoreError> {
        let fragment = BinaryFragment {
            name: upload.name.to_string(),
            locator: FragmentLocator::Url(format!(
                "docstore://{}/{}/{}/{}",
                self.namespace, source_id, upload.hash, upload.variant
            )),
            hash: upload.hash,
            mime_type: upload.mime_type.to_string(),
            size: upload.bytes.len() as u64,
            kind: upload.kind,
            variant: upload.variant,
            source_hash: upload.source_hash,
        };
        fragment.validate()?;

        self.collection
            .put_fragment(StoredFragment {
                source_id: source_id.to_string(),
                fragment: fragment.clone(),
                bytes: Some(upload.bytes.to_vec()),
            })
            .await?;

        tracing::debug!(
            source = source_id,
            hash = %fragment.hash.short(),
            variant = %fragment.variant,
            "fragment registered"
        );
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::memory::MemoryCollection;
    use chrono::Duration;
    use twin_artifact::{ContentHash, FragmentKind, FragmentVariant};

    fn backend() -> (DocStoreBackend, Arc<MemoryCollection>) {
        let collection = Arc::new(MemoryCollection::new());
        (DocStoreBackend::new("tenant-a", collection.clone()), collection)
    }

    #[tokio::test]
    async fn write_then_read_by_key() {
        let (backend, _) = backend();
        let key = ArtifactKey::transcript("doc1", "de");

        let receipt = backend
            .write(&key, "hello", &WriteContext::default())
            .await
            .unwrap();
        assert!(backend.exists(&key).await.unwrap());

        let record = backend.read(&key).await.unwrap();
        assert_eq!(record.markdown, "hello");
        assert_eq!(record.id, receipt.id);

        // Idempotent addressing: the id is the encoded key.
        let id = ArtifactId::parse(&record.id).unwrap();
        let (ns, decoded) = id.decode().unwrap();
        assert_eq!(ns, "tenant-a");
        assert_eq!(decoded, key);
    }

    #[tokio::test]
    async fn write_replaces_previous_content() {
        let (backend, collection) = backend();
        let key = ArtifactKey::transcript("doc1", "de");
        let ctx = WriteContext::default();

        backend.write(&key, "first", &ctx).await.unwrap();
        backend.write(&key, "second", &ctx).await.unwrap();

        assert_eq!(collection.document_count(), 1);
        assert_eq!(backend.read(&key).await.unwrap().markdown, "second");
    }

    #[tokio::test]
    async fn empty_write_rejected_before_collection_touch() {
        let (backend, collection) = backend();
        let key = ArtifactKey::transcript("doc1", "de");

        let err = backend
            .write(&key, "  \n ", &WriteContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyContent(_)));
        assert_eq!(collection.document_count(), 0);
    }

    #[tokio::test]
    async fn templateless_transformation_write_rejected() {
        let (backend, _) = backend();
        let key = ArtifactKey::any_transformation("doc1", "de");

        let err = backend
            .write(&key, "# Report", &WriteContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::AmbiguousTemplate(_)));
    }

    #[tokio::test]
    async fn read_missing_is_not_found() {
        let (backend, _) = backend();
        let key = ArtifactKey::transcript("doc1", "de");
        assert!(backend.read(&key).await.unwrap_err().is_not_found());
        assert!(!backend.exists(&key).await.unwrap());
    }

    #[tokio::test]
    async fn templateless_read_picks_most_recent() {
        let (backend, collection) = backend();
        let ctx = WriteContext::default();

        backend
            .write(&ArtifactKey::transformation("doc1", "de", "report"), "old", &ctx)
            .await
            .unwrap();
        backend
            .write(&ArtifactKey::transformation("doc1", "de", "summary"), "new", &ctx)
            .await
            .unwrap();

        // Force distinct timestamps without sleeping.
        let report_id = ArtifactId::encode(
            "tenant-a",
            &ArtifactKey::transformation("doc1", "de", "report"),
        );
        let mut report = collection.get(report_id.as_str()).await.unwrap().unwrap();
        report.updated_at -= Duration::minutes(5);
        collection.upsert(report).await.unwrap();

        let any = ArtifactKey::any_transformation("doc1", "de");
        assert_eq!(backend.read(&any).await.unwrap().markdown, "new");
    }

    #[tokio::test]
    async fn templateless_read_tie_breaks_lexicographically() {
        let (backend, collection) = backend();
        let ctx = WriteContext::default();

        backend
            .write(&ArtifactKey::transformation("doc1", "de", "zebra"), "z", &ctx)
            .await
            .unwrap();
        backend
            .write(&ArtifactKey::transformation("doc1", "de", "alpha"), "a", &ctx)
            .await
            .unwrap();

        // Pin both to the same instant.
        let now = Utc::now();
        for template in ["zebra", "alpha"] {
            let id =
                ArtifactId::encode("tenant-a", &ArtifactKey::transformation("doc1", "de", template));
            let mut doc = collection.get(id.as_str()).await.unwrap().unwrap();
            doc.updated_at = now;
            collection.upsert(doc).await.unwrap();
        }

        let any = ArtifactKey::any_transformation("doc1", "de");
        assert_eq!(backend.read(&any).await.unwrap().markdown, "a");
    }

    #[tokio::test]
    async fn templateless_read_filters_language() {
        let (backend, _) = backend();
        let ctx = WriteContext::default();

        backend
            .write(&ArtifactKey::transformation("doc1", "en", "report"), "english", &ctx)
            .await
            .unwrap();

        let any_de = ArtifactKey::any_transformation("doc1", "de");
        assert!(backend.read(&any_de).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn put_and_list_fragments() {
        let (backend, _) = backend();
        let bytes = b"pixels";
        let upload = FragmentUpload {
            name: "cover.png",
            bytes,
            mime_type: "image/png",
            kind: FragmentKind::Image,
            variant: FragmentVariant::Original,
            hash: ContentHash::compute(bytes),
            source_hash: None,
        };

        let fragment = backend.put_binary_fragment("doc1", upload).await.unwrap();
        assert_eq!(fragment.size, 6);
        assert!(matches!(fragment.locator, FragmentLocator::Url(_)));

        let listed = backend.list_binary_fragments("doc1").await.unwrap();
        assert_eq!(listed, vec![fragment]);
    }

    #[tokio::test]
    async fn derived_fragment_without_source_hash_rejected() {
        let (backend, _) = backend();
        let bytes = b"thumb";
        let upload = FragmentUpload {
            name: "cover.png",
            bytes,
            mime_type: "image/png",
            kind: FragmentKind::Image,
            variant: FragmentVariant::Thumbnail,
            hash: ContentHash::compute(bytes),
            source_hash: None,
        };

        let err = backend.put_binary_fragment("doc1", upload).await.unwrap_err();
        assert!(matches!(err, StoreError::Fragment(_)));
    }

    #[tokio::test]
    async fn display_name_uses_source_name() {
        let (backend, _) = backend();
        let key = ArtifactKey::transformation("doc1", "de", "report");
        let receipt = backend
            .write(&key, "# Report", &WriteContext::named("Lecture 1"))
            .await
            .unwrap();
        assert_eq!(receipt.name, "Lecture 1 – report (de)");
    }
}
