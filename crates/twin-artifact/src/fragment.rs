//! Binary side-artifacts
//!
//! A [`BinaryFragment`] is an immutable, content-addressed binary attached to a
//! source document (images, audio, video). Fragments are created once per
//! distinct hash and referenced thereafter; derived variants (thumbnails,
//! previews) point back at their original via `source_hash`.

use crate::hash::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Media category of a fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    Image,
    Audio,
    Video,
}

impl FragmentKind {
    /// Stable lowercase tag
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
        }
    }
}

impl Display for FragmentKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role of a fragment relative to its original bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentVariant {
    /// The bytes as uploaded
    Original,
    /// Fixed-size derivation of an original
    Thumbnail,
    /// Larger derivation of an original
    Preview,
}

impl FragmentVariant {
    /// Stable lowercase tag
    #[inline]
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Original => "original",
            Self::Thumbnail => "thumbnail",
            Self::Preview => "preview",
        }
    }

    /// Whether this variant is derived from an original and must carry a
    /// `source_hash`
    #[inline]
    #[must_use]
    pub const fn is_derived(&self) -> bool {
        matches!(self, Self::Thumbnail | Self::Preview)
    }
}

impl Display for FragmentVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a fragment's bytes live
///
/// Either a URL (document-store backends hand out addressable locations) or a
/// backend-local file reference (drive backends hand out provider item ids).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "type", content = "value")]
pub enum FragmentLocator {
    /// Addressable URL
    Url(String),
    /// Provider-native item reference
    ItemRef(String),
}

impl Display for FragmentLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(u) => f.write_str(u),
            Self::ItemRef(r) => f.write_str(r),
        }
    }
}

/// An immutable binary side-artifact, addressed by content hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryFragment {
    /// Display name (usually the uploaded file name)
    pub name: String,
    /// Where the bytes live
    pub locator: FragmentLocator,
    /// Blake3 digest of the bytes
    pub hash: ContentHash,
    /// MIME type of the bytes
    pub mime_type: String,
    /// Size in bytes
    pub size: u64,
    /// Media category
    pub kind: FragmentKind,
    /// Role relative to the original bytes
    pub variant: FragmentVariant,
    /// Hash of the original this fragment derives from; present exactly for
    /// derived variants
    pub source_hash: Option<ContentHash>,
}

impl BinaryFragment {
    /// Validate the fragment's structural invariants
    ///
    /// # Errors
    /// Returns [`FragmentError`] when a derived variant lacks a `source_hash`
    /// or an original carries one.
    pub fn validate(&self) -> Result<(), FragmentError> {
        match (self.variant.is_derived(), &self.source_hash) {
            (true, None) => Err(FragmentError::MissingSourceHash {
                name: self.name.clone(),
                variant: self.variant,
            }),
            (false, Some(_)) => Err(FragmentError::UnexpectedSourceHash {
                name: self.name.clone(),
            }),
            _ => Ok(()),
        }
    }
}

/// Errors related to fragment invariants
#[derive(Debug, thiserror::Error)]
pub enum FragmentError {
    /// Derived variant without a pointer to its original
    #[error("{variant} fragment {name} lacks a source hash")]
    MissingSourceHash {
        name: String,
        variant: FragmentVariant,
    },

    /// Original carrying a derivation pointer
    #[error("original fragment {name} must not carry a source hash")]
    UnexpectedSourceHash { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(variant: FragmentVariant, source_hash: Option<ContentHash>) -> BinaryFragment {
        BinaryFragment {
            name: "cover.png".to_string(),
            locator: FragmentLocator::Url("https://blobs.example/c0ffee".to_string()),
            hash: ContentHash::compute(b"pixels"),
            mime_type: "image/png".to_string(),
            size: 6,
            kind: FragmentKind::Image,
            variant,
            source_hash,
        }
    }

    #[test]
    fn original_without_source_hash_is_valid() {
        assert!(fragment(FragmentVariant::Original, None).validate().is_ok());
    }

    #[test]
    fn thumbnail_requires_source_hash() {
        let missing = fragment(FragmentVariant::Thumbnail, None);
        assert!(matches!(
            missing.validate(),
            Err(FragmentError::MissingSourceHash { .. })
        ));

        let ok = fragment(
            FragmentVariant::Thumbnail,
            Some(ContentHash::compute(b"original")),
        );
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn original_with_source_hash_is_invalid() {
        let bad = fragment(
            FragmentVariant::Original,
            Some(ContentHash::compute(b"what")),
        );
        assert!(matches!(
            bad.validate(),
            Err(FragmentError::UnexpectedSourceHash { .. })
        ));
    }

    #[test]
    fn variant_derivation_flags() {
        assert!(!FragmentVariant::Original.is_derived());
        assert!(FragmentVariant::Thumbnail.is_derived());
        assert!(FragmentVariant::Preview.is_derived());
    }

    #[test]
    fn fragment_serde_round_trip() {
        let frag = fragment(
            FragmentVariant::Preview,
            Some(ContentHash::compute(b"original")),
        );
        let json = serde_json::to_string(&frag).unwrap();
        let decoded: BinaryFragment = serde_json::from_str(&json).unwrap();
        assert_eq!(frag, decoded);
    }
}
