//! Shadow-twin artifact persistence
//!
//! Stores the derived markdown documents of a source (transcripts and
//! template-driven transformations) plus their binary side-artifacts, behind
//! a uniform backend abstraction with two implementations:
//!
//! - [`document::DocStoreBackend`] indexes artifacts by a deterministic
//!   encoded id and answers lookups in a single point read.
//! - [`drive::DriveBackend`] discovers artifacts by naming convention inside
//!   a per-source folder on any hierarchical [`drive::DriveProvider`].
//!
//! [`ShadowTwinStore`] is the façade over both: it owns the primary/fallback
//! order, the superset existence rule, the non-empty write invariant, and the
//! hash-deduplicated fragment pipeline.
//!
//! ```no_run
//! use std::sync::Arc;
//! use twin_artifact::ArtifactKind;
//! use twin_store::document::{DocStoreBackend, MemoryCollection};
//! use twin_store::fragments::NoThumbnailer;
//! use twin_store::{ShadowTwinStore, SourceRef};
//!
//! # async fn demo() -> Result<(), twin_store::StoreError> {
//! let backend = Arc::new(DocStoreBackend::new("notes", Arc::new(MemoryCollection::new())));
//! let store = ShadowTwinStore::new(
//!     SourceRef::new("doc1").with_name("Lecture 1"),
//!     backend,
//!     None,
//!     false,
//!     Arc::new(NoThumbnailer),
//! );
//! store.upsert_markdown(ArtifactKind::Transcript, "de", None, "hello").await?;
//! assert!(store.exists(ArtifactKind::Transcript, "de", None, false).await?);
//! # Ok(())
//! # }
//! ```

mod backend;
mod config;
pub mod document;
pub mod drive;
mod error;
pub mod fragments;
pub mod naming;
mod service;

pub use backend::{
    reject_empty_markdown, ArtifactBackend, FragmentUpload, WriteContext, WriteReceipt,
};
pub use config::{BackendSelection, SourceRef, StoreConfig};
pub use error::StoreError;
pub use service::{CoverImageOutcome, PatchOutcome, ShadowTwinStore};
