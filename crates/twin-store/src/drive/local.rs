//! Local-directory provider
//!
//! [`DriveProvider`] over a directory tree via `tokio::fs`. Item ids are
//! root-relative paths with `/` separators; the root folder's id is the empty
//! string. Useful for local deployments and as the reference provider
//! implementation.

use crate::drive::provider::{DriveProvider, ProviderError, ProviderItem};
use crate::naming;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};

/// Provider over a local directory tree
#[derive(Debug, Clone)]
pub struct LocalDirProvider {
    root: PathBuf,
}

impl LocalDirProvider {
    /// Create a provider rooted at a directory
    #[inline]
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve an item id to an absolute path, rejecting traversal
    fn path_for(&self, item_id: &str) -> Result<PathBuf, ProviderError> {
        if item_id.split('/').any(|seg| seg == "..") {
            return Err(ProviderError::Transport(format!(
                "item id escapes the root: {item_id}"
            )));
        }
        Ok(self.root.join(item_id))
    }

    fn item_from_path(&self, id: String, path: &Path, meta: &std::fs::Metadata) -> ProviderItem {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let modified_at = meta
            .modified()
            .ok()
            .map(DateTime::<Utc>::from);
        let is_folder = meta.is_dir();
        ProviderItem {
            mime_type: (!is_folder).then(|| naming::mime_for_name(&name).to_string()),
            size: if is_folder { 0 } else { meta.len() },
            id,
            name,
            is_folder,
            modified_at,
            web_url: None,
        }
    }

    fn join_id(folder_id: &str, name: &str) -> String {
        if folder_id.is_empty() {
            name.to_string()
        } else {
            format!("{folder_id}/{name}")
        }
    }
}

#[async_trait::async_trait]
impl DriveProvider for LocalDirProvider {
    async fn list_items(&self, folder_id: &str) -> Result<Vec<ProviderItem>, ProviderError> {
        let dir = self.path_for(folder_id)?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProviderError::NotFound(folder_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut items = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let meta = entry.metadata().await?;
            let id = Self::join_id(folder_id, &entry.file_name().to_string_lossy());
            items.push(self.item_from_path(id, &entry.path(), &meta));
        }
        Ok(items)
    }

    async fn get_item(&self, item_id: &str) -> Result<ProviderItem, ProviderError> {
        let path = self.path_for(item_id)?;
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProviderError::NotFound(item_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        Ok(self.item_from_path(item_id.to_string(), &path, &meta))
    }

    async fn get_binary(&self, item_id: &str) -> Result<Vec<u8>, ProviderError> {
        let path = self.path_for(item_id)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ProviderError::NotFound(item_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn upload_file(
        &self,
        folder_id: &str,
        name: &str,
        bytes: &[u8],
        _mime_type: &str,
    ) -> Result<ProviderItem, ProviderError> {
        let id = Self::join_id(folder_id, name);
        let path = self.path_for(&id)?;
        tokio::fs::write(&path, bytes).await?;
        let meta = tokio::fs::metadata(&path).await?;
        Ok(self.item_from_path(id, &path, &meta))
    }

    async fn delete_item(&self, item_id: &str) -> Result<(), ProviderError> {
        let path = self.path_for(item_id)?;
        let meta = match tokio::fs::metadata(&path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ProviderError::NotFound(item_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        if meta.is_dir() {
            tokio::fs::remove_dir_all(&path).await?;
        } else {
            tokio::fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn create_folder(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<ProviderItem, ProviderError> {
        let id = Self::join_id(parent_id, name);
        let path = self.path_for(&id)?;
        tokio::fs::create_dir_all(&path).await?;
        let meta = tokio::fs::metadata(&path).await?;
        Ok(self.item_from_path(id, &path, &meta))
    }
}
