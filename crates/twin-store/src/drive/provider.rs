//! Drive provider port
//!
//! The hierarchical backend never assumes a particular transport; any
//! cloud-drive or filesystem exposing folders, listings and uploads fits this
//! trait. Item ids are provider-native and opaque to everything above.

use chrono::{DateTime, Utc};

/// One entry in a provider folder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderItem {
    /// Provider-native item id
    pub id: String,
    /// Entry name within its folder
    pub name: String,
    /// MIME type, when the provider knows it
    pub mime_type: Option<String>,
    /// Size in bytes (0 for folders)
    pub size: u64,
    /// Whether this entry is a folder
    pub is_folder: bool,
    /// Last modification time, when the provider reports one
    pub modified_at: Option<DateTime<Utc>>,
    /// Addressable URL, when the provider exposes one
    pub web_url: Option<String>,
}

/// Hierarchical storage provider contract
#[async_trait::async_trait]
pub trait DriveProvider: Send + Sync {
    /// List the entries of a folder
    async fn list_items(&self, folder_id: &str) -> Result<Vec<ProviderItem>, ProviderError>;

    /// Fetch one item's metadata
    async fn get_item(&self, item_id: &str) -> Result<ProviderItem, ProviderError>;

    /// Download an item's bytes
    async fn get_binary(&self, item_id: &str) -> Result<Vec<u8>, ProviderError>;

    /// Upload a file into a folder, replacing nothing (callers delete first)
    async fn upload_file(
        &self,
        folder_id: &str,
        name: &str,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<ProviderItem, ProviderError>;

    /// Delete an item
    async fn delete_item(&self, item_id: &str) -> Result<(), ProviderError>;

    /// Create a folder
    async fn create_folder(&self, parent_id: &str, name: &str)
        -> Result<ProviderItem, ProviderError>;
}

/// Provider transport errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Item or folder does not exist
    #[error("provider item not found: {0}")]
    NotFound(String),

    /// Transport failure
    #[error("provider transport error: {0}")]
    Transport(String),

    /// Filesystem error (local providers)
    #[error("provider io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProviderError> for crate::error::StoreError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::NotFound(what) => Self::NotFound(what),
            other => Self::BackendUnavailable(other.to_string()),
        }
    }
}
