//! Store configuration
//!
//! Per-tenant selection of the primary backend, the optional fallback, and
//! best-effort dual persistence.

use serde::{Deserialize, Serialize};

/// Which backend implementation serves a role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendSelection {
    /// Key-indexed document-store backend (O(1) lookup by encoded id)
    DocumentStore,
    /// Hierarchical drive backend (discovery by naming convention)
    Drive,
}

/// Per-tenant store configuration
///
/// The fallback is always the backend not chosen as primary; it is consulted
/// only when `allow_fallback` is set. `dual_persist` additionally mirrors
/// writes to the fallback on a best-effort basis and has no effect without
/// `allow_fallback`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// First-choice backend
    pub primary_backend: BackendSelection,
    /// Consult the other backend when the primary misses
    pub allow_fallback: bool,
    /// Mirror writes to the fallback, best effort
    pub dual_persist: bool,
}

impl StoreConfig {
    /// Create a configuration with the given primary and no fallback
    #[inline]
    #[must_use]
    pub fn new(primary_backend: BackendSelection) -> Self {
        Self {
            primary_backend,
            allow_fallback: false,
            dual_persist: false,
        }
    }

    /// Enable the fallback backend
    #[inline]
    #[must_use]
    pub fn with_fallback(mut self) -> Self {
        self.allow_fallback = true;
        self
    }

    /// Enable best-effort dual persistence (implies consulting the fallback)
    #[inline]
    #[must_use]
    pub fn with_dual_persist(mut self) -> Self {
        self.allow_fallback = true;
        self.dual_persist = true;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(BackendSelection::DocumentStore)
    }
}

/// The source document a store instance is bound to
///
/// Every shadow-twin store serves the derived artifacts of exactly one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Identity of the source document
    pub source_id: String,
    /// Human-readable name, used when deriving artifact display names
    pub source_name: Option<String>,
}

impl SourceRef {
    /// Create a source reference
    #[inline]
    #[must_use]
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            source_name: None,
        }
    }

    /// Attach a display name
    #[inline]
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }
}
