//! Hierarchical drive backend (discovery by naming convention)

mod backend;
mod local;
mod provider;

pub use backend::DriveBackend;
pub use local::LocalDirProvider;
pub use provider::{DriveProvider, ProviderError, ProviderItem};
