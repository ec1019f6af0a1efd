//! Key-indexed document-store backend

mod backend;
mod collection;
mod memory;

pub use backend::DocStoreBackend;
pub use collection::{CollectionError, DocumentCollection, StoredDocument, StoredFragment};
pub use memory::MemoryCollection;
