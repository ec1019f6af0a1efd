//! Error types for the shadow-twin store
//!
//! One taxonomy for every backend and the orchestration layer. `NotFound` is
//! the only variant callers routinely branch on; everything else surfaces.

use twin_artifact::{FragmentError, FrontmatterError, IdentifierError, KeyError};

/// Main store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Key has no artifact; recoverable, callers branch on it
    #[error("artifact not found: {0}")]
    NotFound(String),

    /// Write rejected before any I/O; always a caller bug, never retried
    #[error("empty content rejected for {0}")]
    EmptyContent(String),

    /// Opaque id decode failure; surfaced, never guessed at
    #[error("malformed identifier: {0}")]
    MalformedIdentifier(#[from] IdentifierError),

    /// Transport or configuration failure in a backend
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A transformation needed a template name that could not be determined
    #[error("ambiguous template: {0}")]
    AmbiguousTemplate(String),

    /// Fragment structural invariant violated
    #[error("fragment invariant violated: {0}")]
    Fragment(#[from] FragmentError),

    /// Frontmatter could not be re-encoded during a patch
    #[error("frontmatter error: {0}")]
    Frontmatter(#[from] FrontmatterError),
}

impl StoreError {
    /// Whether this is the recoverable not-found condition
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<KeyError> for StoreError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::TemplateRequired { .. } => Self::AmbiguousTemplate(err.to_string()),
            KeyError::UnknownKind(_) => Self::BackendUnavailable(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twin_artifact::ArtifactKey;

    #[test]
    fn not_found_predicate() {
        assert!(StoreError::NotFound("doc1/transcript/de".to_string()).is_not_found());
        assert!(!StoreError::EmptyContent("doc1".to_string()).is_not_found());
    }

    #[test]
    fn template_required_maps_to_ambiguous_template() {
        let key = ArtifactKey::any_transformation("doc1", "de");
        let err: StoreError = key.require_template().unwrap_err().into();
        assert!(matches!(err, StoreError::AmbiguousTemplate(_)));
    }

    #[test]
    fn identifier_error_maps_to_malformed() {
        let err = twin_artifact::ArtifactId::parse("garbage").unwrap_err();
        let store_err: StoreError = err.into();
        assert!(matches!(store_err, StoreError::MalformedIdentifier(_)));
    }
}
