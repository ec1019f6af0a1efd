//! Drive backend
//!
//! No side index: artifacts live in one folder per source under a configured
//! root, and `exists`/`read` resolve by listing that folder and matching the
//! naming convention. Resolution cost is O(entries in the folder); callers
//! needing frequent reads should prefer the document-store backend as primary.
//!
//! Writes are delete-then-recreate, since in-place overwrite-by-id is not
//! assumed available from providers. Item ids are therefore not stable across
//! moves; callers must re-resolve after moving anything.

use crate::backend::{
    select_latest, ArtifactBackend, FragmentUpload, WriteContext, WriteReceipt,
    reject_empty_markdown,
};
use crate::drive::provider::{DriveProvider, ProviderError, ProviderItem};
use crate::error::StoreError;
use crate::naming;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use twin_artifact::{
    frontmatter, ArtifactKey, ArtifactKind, ArtifactRecord, BinaryFragment, FragmentLocator,
};

const MEDIA_FOLDER: &str = "media";
const MARKDOWN_MIME: &str = "text/markdown";

/// Backend over a hierarchical drive provider
#[derive(Clone)]
pub struct DriveBackend {
    provider: Arc<dyn DriveProvider>,
    root_folder_id: String,
}

impl DriveBackend {
    /// Create a backend under a root folder
    #[inline]
    pub fn new(provider: Arc<dyn DriveProvider>, root_folder_id: impl Into<String>) -> Self {
        Self {
            provider,
            root_folder_id: root_folder_id.into(),
        }
    }

    /// Find the folder holding a source's artifacts, without creating it
    async fn source_folder(&self, source_id: &str) -> Result<Option<ProviderItem>, StoreError> {
        let entries = self
            .provider
            .list_items(&self.root_folder_id)
            .await
            .map_err(|e| {
                StoreError::BackendUnavailable(format!(
                    "root folder {} unavailable: {e}",
                    self.root_folder_id
                ))
            })?;
        Ok(entries
            .into_iter()
            .find(|item| item.is_folder && item.name == source_id))
    }

    async fn ensure_source_folder(&self, source_id: &str) -> Result<ProviderItem, StoreError> {
        if let Some(folder) = self.source_folder(source_id).await? {
            return Ok(folder);
        }
        Ok(self
            .provider
            .create_folder(&self.root_folder_id, source_id)
            .await?)
    }

    /// Resolve a key to its file by listing and name-matching
    async fn find_artifact(&self, key: &ArtifactKey) -> Result<Option<ProviderItem>, StoreError> {
        let Some(folder) = self.source_folder(&key.source_id).await? else {
            return Ok(None);
        };
        // The folder may vanish between discovery and listing; an artifact in
        // a gone folder is simply absent.
        let entries = match self.provider.list_items(&folder.id).await {
            Ok(entries) => entries,
            Err(ProviderError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let matches: Vec<ProviderItem> = entries
            .into_iter()
            .filter(|item| !item.is_folder)
            .filter(|item| {
                naming::parse_artifact_file_name(&item.name)
                    .is_some_and(|parsed| parsed.matches(key))
            })
            .collect();

        if key.kind == ArtifactKind::Transformation && key.template_name.is_none() {
            // Any-template read: same most-recent rule as the document store,
            // over provider modification times.
            return Ok(select_latest(
                matches,
                |item| item.modified_at.unwrap_or(DateTime::<Utc>::MIN_UTC),
                |item| {
                    naming::parse_artifact_file_name(&item.name)
                        .and_then(|parsed| parsed.template_name)
                        .unwrap_or_default()
                },
            ));
        }
        Ok(matches.into_iter().next())
    }

    async fn media_folder(
        &self,
        source_folder: &ProviderItem,
    ) -> Result<Option<ProviderItem>, StoreError> {
        let entries = self.provider.list_items(&source_folder.id).await?;
        Ok(entries
            .into_iter()
            .find(|item| item.is_folder && item.name == MEDIA_FOLDER))
    }

    fn locator_for(item: &ProviderItem) -> FragmentLocator {
        match &item.web_url {
            Some(url) => FragmentLocator::Url(url.clone()),
            None => FragmentLocator::ItemRef(item.id.clone()),
        }
    }
}

#[async_trait::async_trait]
impl ArtifactBackend for DriveBackend {
    async fn exists(&self, key: &ArtifactKey) -> Result<bool, StoreError> {
        Ok(self.find_artifact(key).await?.is_some())
    }

    async fn read(&self, key: &ArtifactKey) -> Result<ArtifactRecord, StoreError> {
        let item = self
            .find_artifact(key)
            .await?
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        let bytes = self.provider.get_binary(&item.id).await?;
        let markdown = String::from_utf8(bytes).map_err(|_| {
            StoreError::BackendUnavailable(format!("artifact {} is not valid utf-8", item.name))
        })?;
        let (metadata, _) = frontmatter::parse(&markdown);
        Ok(ArtifactRecord {
            id: item.id,
            name: item.name,
            markdown,
            frontmatter: metadata,
        })
    }

    async fn write(
        &self,
        key: &ArtifactKey,
        markdown: &str,
        _ctx: &WriteContext,
    ) -> Result<WriteReceipt, StoreError> {
        reject_empty_markdown(key, markdown)?;
        key.require_template()?;

        let folder = self.ensure_source_folder(&key.source_id).await?;
        if let Some(existing) = self.find_artifact(key).await? {
            self.provider.delete_item(&existing.id).await?;
        }

        let name = naming::artifact_file_name(key);
        let item = self
            .provider
            .upload_file(&folder.id, &name, markdown.as_bytes(), MARKDOWN_MIME)
            .await?;

        tracing::debug!(item = %item.id, source = %key.source_id, "drive write");
        Ok(WriteReceipt {
            id: item.id,
            name: item.name,
        })
    }

    async fn list_binary_fragments(
        &self,
        source_id: &str,
    ) -> Result<Vec<BinaryFragment>, StoreError> {
        let folder = self
            .source_folder(source_id)
            .await?
            .ok_or_else(|| StoreError::NotFound(source_id.to_string()))?;
        let Some(media) = self.media_folder(&folder).await? else {
            return Ok(Vec::new());
        };

        let entries = self.provider.list_items(&media.id).await?;
        Ok(entries
            .into_iter()
            .filter(|item| !item.is_folder)
            .filter_map(|item| {
                let parsed = naming::parse_fragment_file_name(&item.name)?;
                let mime = item
                    .mime_type
                    .clone()
                    .unwrap_or_else(|| naming::mime_for_name(&parsed.name).to_string());
                let kind = naming::fragment_kind_for_mime(&mime)?;
                Some(BinaryFragment {
                    locator: Self::locator_for(&item),
                    name: parsed.name,
                    hash: parsed.hash,
                    mime_type: mime,
                    size: item.size,
                    kind,
                    variant: parsed.variant,
                    source_hash: parsed.source_hash,
                })
            })
            .collect())
    }

    async fn put_binary_fragment(
        &self,
        source_id: &str,
        upload: FragmentUpload<'_>,
    ) -> Result<BinaryFragment, StoreError> {
        let mut fragment = BinaryFragment {
            name: upload.name.to_string(),
            locator: FragmentLocator::ItemRef(String::new()),
            hash: upload.hash,
            mime_type: upload.mime_type.to_string(),
            size: upload.bytes.len() as u64,
            kind: upload.kind,
            variant: upload.variant,
            source_hash: upload.source_hash,
        };
        // Invariants hold before anything is uploaded.
        fragment.validate()?;

        let folder = self.ensure_source_folder(source_id).await?;
        let media = match self.media_folder(&folder).await? {
            Some(media) => media,
            None => self.provider.create_folder(&folder.id, MEDIA_FOLDER).await?,
        };

        let file_name = naming::fragment_file_name(
            upload.variant,
            &upload.hash,
            upload.source_hash.as_ref(),
            upload.name,
        );
        let item = self
            .provider
            .upload_file(&media.id, &file_name, upload.bytes, upload.mime_type)
            .await?;

        fragment.locator = Self::locator_for(&item);
        tracing::debug!(
            source = source_id,
            hash = %fragment.hash.short(),
            variant = %fragment.variant,
            "drive fragment upload"
        );
        Ok(fragment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drive::local::LocalDirProvider;
    use twin_artifact::{ContentHash, FragmentKind, FragmentVariant};

    fn backend(dir: &tempfile::TempDir) -> DriveBackend {
        DriveBackend::new(Arc::new(LocalDirProvider::new(dir.path())), "")
    }

    #[tokio::test]
    async fn write_creates_folder_and_conventional_name() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let key = ArtifactKey::transcript("doc1", "de");

        let receipt = backend
            .write(&key, "hello", &WriteContext::default())
            .await
            .unwrap();
        assert_eq!(receipt.name, "transcript.de.md");
        assert!(dir.path().join("doc1/transcript.de.md").exists());
    }

    #[tokio::test]
    async fn read_resolves_by_listing() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let key = ArtifactKey::transformation("doc1", "de", "report");

        backend
            .write(&key, "---\ntitle: R\n---\n# Report", &WriteContext::default())
            .await
            .unwrap();

        assert!(backend.exists(&key).await.unwrap());
        let record = backend.read(&key).await.unwrap();
        assert_eq!(record.name, "transformation.de.report.md");
        assert!(record.markdown.contains("# Report"));
        assert_eq!(
            record.frontmatter_value("title").and_then(|v| v.as_str()),
            Some("R")
        );
    }

    #[tokio::test]
    async fn write_is_delete_then_recreate() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let key = ArtifactKey::transcript("doc1", "de");
        let ctx = WriteContext::default();

        backend.write(&key, "first", &ctx).await.unwrap();
        backend.write(&key, "second", &ctx).await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path().join("doc1"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(backend.read(&key).await.unwrap().markdown, "second");
    }

    #[tokio::test]
    async fn empty_write_never_reaches_the_provider() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let key = ArtifactKey::transcript("doc1", "de");

        let err = backend
            .write(&key, "   ", &WriteContext::default())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::EmptyContent(_)));
        assert!(!dir.path().join("doc1").exists());
    }

    #[tokio::test]
    async fn missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let key = ArtifactKey::transcript("doc1", "de");

        assert!(!backend.exists(&key).await.unwrap());
        assert!(backend.read(&key).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn template_match_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);

        backend
            .write(
                &ArtifactKey::transformation("doc1", "de", "Report"),
                "# R",
                &WriteContext::default(),
            )
            .await
            .unwrap();

        let lowercased = ArtifactKey::transformation("doc1", "de", "report");
        assert!(backend.exists(&lowercased).await.unwrap());
    }

    #[tokio::test]
    async fn fragments_round_trip_through_media_folder() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let bytes = b"pixels";
        let hash = ContentHash::compute(bytes);

        let fragment = backend
            .put_binary_fragment(
                "doc1",
                FragmentUpload {
                    name: "cover.png",
                    bytes,
                    mime_type: "image/png",
                    kind: FragmentKind::Image,
                    variant: FragmentVariant::Original,
                    hash,
                    source_hash: None,
                },
            )
            .await
            .unwrap();
        assert!(matches!(fragment.locator, FragmentLocator::ItemRef(_)));

        let listed = backend.list_binary_fragments("doc1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].hash, hash);
        assert_eq!(listed[0].name, "cover.png");
        assert_eq!(listed[0].kind, FragmentKind::Image);
    }

    #[tokio::test]
    async fn fragments_for_unknown_source_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let backend = backend(&dir);
        let err = backend.list_binary_fragments("nope").await.unwrap_err();
        assert!(err.is_not_found());
    }

    /// Lists a source folder at the root but answers `NotFound` for its
    /// contents, as a provider does when the folder is deleted between the
    /// two listings.
    struct VanishingFolderProvider;

    #[async_trait::async_trait]
    impl DriveProvider for VanishingFolderProvider {
        async fn list_items(
            &self,
            folder_id: &str,
        ) -> Result<Vec<ProviderItem>, ProviderError> {
            if folder_id.is_empty() {
                Ok(vec![ProviderItem {
                    id: "doc1".to_string(),
                    name: "doc1".to_string(),
                    mime_type: None,
                    size: 0,
                    is_folder: true,
                    modified_at: None,
                    web_url: None,
                }])
            } else {
                Err(ProviderError::NotFound(folder_id.to_string()))
            }
        }

        async fn get_item(&self, item_id: &str) -> Result<ProviderItem, ProviderError> {
            Err(ProviderError::NotFound(item_id.to_string()))
        }

        async fn get_binary(&self, item_id: &str) -> Result<Vec<u8>, ProviderError> {
            Err(ProviderError::NotFound(item_id.to_string()))
        }

        async fn upload_file(
            &self,
            _folder_id: &str,
            _name: &str,
            _bytes: &[u8],
            _mime_type: &str,
        ) -> Result<ProviderItem, ProviderError> {
            Err(ProviderError::Transport("read-only".to_string()))
        }

        async fn delete_item(&self, item_id: &str) -> Result<(), ProviderError> {
            Err(ProviderError::NotFound(item_id.to_string()))
        }

        async fn create_folder(
            &self,
            _parent_id: &str,
            _name: &str,
        ) -> Result<ProviderItem, ProviderError> {
            Err(ProviderError::Transport("read-only".to_string()))
        }
    }

    #[tokio::test]
    async fn folder_vanishing_after_discovery_reads_as_absent() {
        let backend = DriveBackend::new(Arc::new(VanishingFolderProvider), "");
        let key = ArtifactKey::transcript("doc1", "de");

        assert!(!backend.exists(&key).await.unwrap());
        assert!(backend.read(&key).await.unwrap_err().is_not_found());
    }
}
