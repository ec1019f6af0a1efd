//! Shadow-Twin Artifact Value Types
//!
//! Leaf types shared by every storage backend:
//!
//! - [`ArtifactKey`]: source + kind + language + optional template
//! - [`ArtifactId`]: opaque deterministic identifier codec
//! - [`ContentHash`]: 32-byte Blake3 hash for fragment addressing
//! - [`BinaryFragment`]: immutable binary side-artifact with variants
//! - [`ArtifactRecord`]: a persisted derived document
//! - [`frontmatter`]: YAML frontmatter parse/serialize/patch
//!
//! # Example
//!
//! ```rust
//! use twin_artifact::{ArtifactId, ArtifactKey};
//!
//! let key = ArtifactKey::transformation("doc1", "de", "report");
//! let id = ArtifactId::encode("tenant-a", &key);
//!
//! // The id alone recovers the full key, no lookup needed.
//! let (namespace, decoded) = id.decode().unwrap();
//! assert_eq!(namespace, "tenant-a");
//! assert_eq!(decoded, key);
//! ```

#![warn(unreachable_pub)]

mod fragment;
mod hash;
mod id;
mod key;
mod record;

pub mod frontmatter;

pub use fragment::{BinaryFragment, FragmentError, FragmentKind, FragmentLocator, FragmentVariant};
pub use frontmatter::FrontmatterError;
pub use hash::{ContentHash, HashError};
pub use id::{ArtifactId, IdentifierError};
pub use key::{ArtifactKey, ArtifactKind, KeyError};
pub use record::ArtifactRecord;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
