//! Artifact keys
//!
//! An [`ArtifactKey`] identifies one derived artifact of a source document:
//! which source, which kind of derivation, which target language, and (for
//! template-driven transformations) which template produced it.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Artifact category
///
/// Wire tags are stable lowercase identifiers; persisted ids and conventional
/// file names embed them, so they must never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    /// Raw extracted text for a source document
    Transcript,
    /// Template-processed output derived from a transcript
    Transformation,
}

impl ArtifactKind {
    /// Stable lowercase tag
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Transcript => "transcript",
            Self::Transformation => "transformation",
        }
    }
}

impl Display for ArtifactKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transcript" => Ok(Self::Transcript),
            "transformation" => Ok(Self::Transformation),
            other => Err(KeyError::UnknownKind(other.to_string())),
        }
    }
}

/// Key identifying one artifact of a source document
///
/// # Template invariant
/// `template_name` is mandatory for any `Transformation` key used on a write
/// path (the artifact could not be re-resolved unambiguously otherwise). A
/// `None` template on a read query means "any template, most recently updated".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactKey {
    /// Identity of the source document this artifact derives from
    pub source_id: String,
    /// Artifact category
    pub kind: ArtifactKind,
    /// Target language code (e.g. "de", "en")
    pub target_language: String,
    /// Template that produced a transformation; `None` only on read queries
    pub template_name: Option<String>,
}

impl ArtifactKey {
    /// Create a transcript key
    #[inline]
    #[must_use]
    pub fn transcript(source_id: impl Into<String>, target_language: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            kind: ArtifactKind::Transcript,
            target_language: target_language.into(),
            template_name: None,
        }
    }

    /// Create a transformation key for a specific template
    #[inline]
    #[must_use]
    pub fn transformation(
        source_id: impl Into<String>,
        target_language: impl Into<String>,
        template_name: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            kind: ArtifactKind::Transformation,
            target_language: target_language.into(),
            template_name: Some(template_name.into()),
        }
    }

    /// Create a transformation read query matching any template
    ///
    /// Resolution picks the most recently updated match; see the backend
    /// contract for the tie-break.
    #[inline]
    #[must_use]
    pub fn any_transformation(
        source_id: impl Into<String>,
        target_language: impl Into<String>,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            kind: ArtifactKind::Transformation,
            target_language: target_language.into(),
            template_name: None,
        }
    }

    /// Reject a template-less transformation key
    ///
    /// Write paths call this on every key; transcripts pass unchanged.
    ///
    /// # Errors
    /// Returns [`KeyError::TemplateRequired`] for a transformation key with no
    /// template.
    pub fn require_template(&self) -> Result<(), KeyError> {
        if self.kind == ArtifactKind::Transformation && self.template_name.is_none() {
            return Err(KeyError::TemplateRequired {
                source_id: self.source_id.clone(),
                target_language: self.target_language.clone(),
            });
        }
        Ok(())
    }
}

impl Display for ArtifactKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.template_name {
            Some(t) => write!(
                f,
                "{}/{}/{}/{}",
                self.source_id, self.kind, self.target_language, t
            ),
            None => write!(f, "{}/{}/{}", self.source_id, self.kind, self.target_language),
        }
    }
}

/// Errors related to artifact keys
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// Kind tag not recognised
    #[error("unknown artifact kind: {0}")]
    UnknownKind(String),

    /// Transformation write path without a template
    #[error("transformation for source {source_id} ({target_language}) requires a template name")]
    TemplateRequired {
        source_id: String,
        target_language: String,
    },
}
