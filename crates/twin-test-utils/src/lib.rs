//! Testing utilities for the shadow-twin workspace
//!
//! In-memory fakes for the drive provider and the backend contract, canned
//! thumbnailers, and tracing setup for tests.

#![allow(missing_docs)]

use chrono::Utc;
use dashmap::DashMap;
use std::sync::{Arc, Mutex, Once};
use twin_artifact::{ArtifactKey, ArtifactRecord, BinaryFragment};
use twin_store::drive::{DriveProvider, ProviderError, ProviderItem};
use twin_store::fragments::{DerivedImage, ThumbnailError, Thumbnailer};
use twin_store::{ArtifactBackend, FragmentUpload, StoreError, WriteContext, WriteReceipt};
use ulid::Ulid;

/// Id of the implicit root folder of a [`MemoryDriveProvider`]
pub const MEMORY_ROOT_ID: &str = "root";

struct MemoryEntry {
    item: ProviderItem,
    parent: String,
    bytes: Option<Vec<u8>>,
}

/// In-memory [`DriveProvider`] with ulid item ids
///
/// The root folder exists from the start under [`MEMORY_ROOT_ID`].
pub struct MemoryDriveProvider {
    entries: DashMap<String, MemoryEntry>,
}

impl MemoryDriveProvider {
    pub fn new() -> Self {
        let entries = DashMap::new();
        entries.insert(
            MEMORY_ROOT_ID.to_string(),
            MemoryEntry {
                item: ProviderItem {
                    id: MEMORY_ROOT_ID.to_string(),
                    name: String::new(),
                    mime_type: None,
                    size: 0,
                    is_folder: true,
                    modified_at: Some(Utc::now()),
                    web_url: None,
                },
                parent: String::new(),
                bytes: None,
            },
        );
        Self { entries }
    }

    /// Number of stored entries, root included
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn require_folder(&self, folder_id: &str) -> Result<(), ProviderError> {
        match self.entries.get(folder_id) {
            Some(entry) if entry.item.is_folder => Ok(()),
            _ => Err(ProviderError::NotFound(folder_id.to_string())),
        }
    }
}

impl Default for MemoryDriveProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DriveProvider for MemoryDriveProvider {
    async fn list_items(&self, folder_id: &str) -> Result<Vec<ProviderItem>, ProviderError> {
        self.require_folder(folder_id)?;
        Ok(self
            .entries
            .iter()
            .filter(|e| e.parent == folder_id && e.item.id != folder_id)
            .map(|e| e.item.clone())
            .collect())
    }

    async fn get_item(&self, item_id: &str) -> Result<ProviderItem, ProviderError> {
        self.entries
            .get(item_id)
            .map(|e| e.item.clone())
            .ok_or_else(|| ProviderError::NotFound(item_id.to_string()))
    }

    async fn get_binary(&self, item_id: &str) -> Result<Vec<u8>, ProviderError> {
        self.entries
            .get(item_id)
            .and_then(|e| e.bytes.clone())
            .ok_or_else(|| ProviderError::NotFound(item_id.to_string()))
    }

    async fn upload_file(
        &self,
        folder_id: &str,
        name: &str,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<ProviderItem, ProviderError> {
        self.require_folder(folder_id)?;
        let id = Ulid::new().to_string();
        let item = ProviderItem {
            id: id.clone(),
            name: name.to_string(),
            mime_type: Some(mime_type.to_string()),
            size: bytes.len() as u64,
            is_folder: false,
            modified_at: Some(Utc::now()),
            web_url: Some(format!("memory://{id}")),
        };
        self.entries.insert(
            id,
            MemoryEntry {
                item: item.clone(),
                parent: folder_id.to_string(),
                bytes: Some(bytes.to_vec()),
            },
        );
        Ok(item)
    }

    async fn delete_item(&self, item_id: &str) -> Result<(), ProviderError> {
        if self.entries.remove(item_id).is_none() {
            return Err(ProviderError::NotFound(item_id.to_string()));
        }
        // Cascade into descendants.
        let mut frontier = vec![item_id.to_string()];
        while let Some(parent) = frontier.pop() {
            let children: Vec<String> = self
                .entries
                .iter()
                .filter(|e| e.parent == parent)
                .map(|e| e.item.id.clone())
                .collect();
            for child in children {
                self.entries.remove(&child);
                frontier.push(child);
            }
        }
        Ok(())
    }

    async fn create_folder(
        &self,
        parent_id: &str,
        name: &str,
    ) -> Result<ProviderItem, ProviderError> {
        self.require_folder(parent_id)?;
        if let Some(existing) = self
            .entries
            .iter()
            .find(|e| e.parent == parent_id && e.item.is_folder && e.item.name == name)
        {
            return Ok(existing.item.clone());
        }
        let id = Ulid::new().to_string();
        let item = ProviderItem {
            id: id.clone(),
            name: name.to_string(),
            mime_type: None,
            size: 0,
            is_folder: true,
            modified_at: Some(Utc::now()),
            web_url: None,
        };
        self.entries.insert(
            id,
            MemoryEntry {
                item: item.clone(),
                parent: parent_id.to_string(),
                bytes: None,
            },
        );
        Ok(item)
    }
}

/// Backend decorator that records every call it forwards
///
/// Tests assert on call order across backends (primary before fallback) and
/// on call counts (no I/O on rejected writes, single upload on dedup hits).
pub struct RecordingBackend {
    inner: Arc<dyn ArtifactBackend>,
    calls: Mutex<Vec<String>>,
}

impl RecordingBackend {
    pub fn new(inner: Arc<dyn ArtifactBackend>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every recorded call, oldest first
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// How often an operation was invoked
    pub fn call_count(&self, op: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(op))
            .count()
    }

    fn record(&self, op: &str, detail: impl std::fmt::Display) {
        self.calls.lock().unwrap().push(format!("{op} {detail}"));
    }
}

#[async_trait::async_trait]
impl ArtifactBackend for RecordingBackend {
    async fn exists(&self, key: &ArtifactKey) -> Result<bool, StoreError> {
        self.record("exists", key);
        self.inner.exists(key).await
    }

    async fn read(&self, key: &ArtifactKey) -> Result<ArtifactRecord, StoreError> {
        self.record("read", key);
        self.inner.read(key).await
    }

    async fn write(
        &self,
        key: &ArtifactKey,
        markdown: &str,
        ctx: &WriteContext,
    ) -> Result<WriteReceipt, StoreError> {
        self.record("write", key);
        self.inner.write(key, markdown, ctx).await
    }

    async fn list_binary_fragments(
        &self,
        source_id: &str,
    ) -> Result<Vec<BinaryFragment>, StoreError> {
        self.record("list_binary_fragments", source_id);
        self.inner.list_binary_fragments(source_id).await
    }

    async fn put_binary_fragment(
        &self,
        source_id: &str,
        upload: FragmentUpload<'_>,
    ) -> Result<BinaryFragment, StoreError> {
        self.record("put_binary_fragment", source_id);
        self.inner.put_binary_fragment(source_id, upload).await
    }
}

/// A [`Thumbnailer`] that always hands back the same derived bytes
#[derive(Debug, Clone)]
pub struct FixedThumbnailer {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl FixedThumbnailer {
    pub fn png(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: "image/png".to_string(),
        }
    }
}

impl Thumbnailer for FixedThumbnailer {
    fn derive(&self, _bytes: &[u8], _mime_type: &str) -> Result<DerivedImage, ThumbnailError> {
        Ok(DerivedImage {
            bytes: self.bytes.clone(),
            mime_type: self.mime_type.clone(),
        })
    }
}

/// A [`Thumbnailer`] that always fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingThumbnailer;

impl Thumbnailer for FailingThumbnailer {
    fn derive(&self, _bytes: &[u8], _mime_type: &str) -> Result<DerivedImage, ThumbnailError> {
        Err(ThumbnailError::Failed("deliberately broken".to_string()))
    }
}

static TRACING_INIT: Once = Once::new();

/// Install a test tracing subscriber once per process
///
/// Honors `RUST_LOG`; output goes through the test writer so it stays attached
/// to the owning test.
pub fn init_test_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
