//! Naming conventions
//!
//! The drive backend has no side index: kind, language and template are
//! encoded into file names, and resolution works by listing a folder and
//! parsing the names back. The document-store backend reuses the same artifact
//! names for display so both backends name artifacts alike.
//!
//! Artifact files: `{kind}.{lang}[.{template}].md`
//! Fragment files: `{variant_tag}~{hash}[~{source_hash}]~{name}`

use twin_artifact::{ArtifactKey, ArtifactKind, ContentHash, FragmentKind, FragmentVariant};

/// Conventional file name for an artifact key
///
/// The template segment is sanitized so the name stays parseable; matching is
/// sanitization-aware on both sides.
#[must_use]
pub fn artifact_file_name(key: &ArtifactKey) -> String {
    match key.template_name.as_deref() {
        Some(template) => format!(
            "{}.{}.{}.md",
            key.kind,
            key.target_language,
            sanitize_segment(template)
        ),
        None => format!("{}.{}.md", key.kind, key.target_language),
    }
}

/// Key fields recovered from a conventional file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArtifactName {
    pub kind: ArtifactKind,
    pub target_language: String,
    pub template_name: Option<String>,
}

impl ParsedArtifactName {
    /// Whether this name satisfies a read key
    ///
    /// A transformation key without a template matches any template (the
    /// caller selects among matches); a keyed template matches
    /// case-insensitively after sanitization.
    #[must_use]
    pub fn matches(&self, key: &ArtifactKey) -> bool {
        if self.kind != key.kind || self.target_language != key.target_language {
            return false;
        }
        match (&key.template_name, &self.template_name) {
            (None, _) => true,
            (Some(wanted), Some(actual)) => {
                sanitize_segment(wanted).eq_ignore_ascii_case(actual)
            }
            (Some(_), None) => false,
        }
    }
}

/// Parse a conventional artifact file name
///
/// Returns `None` for names that do not follow the convention; directory
/// listings routinely contain unrelated files.
#[must_use]
pub fn parse_artifact_file_name(name: &str) -> Option<ParsedArtifactName> {
    let stem = name.strip_suffix(".md")?;
    let segments: Vec<&str> = stem.split('.').collect();
    let kind: ArtifactKind = segments.first()?.parse().ok()?;
    match (kind, segments.as_slice()) {
        (ArtifactKind::Transcript, [_, lang]) => Some(ParsedArtifactName {
            kind,
            target_language: (*lang).to_string(),
            template_name: None,
        }),
        (ArtifactKind::Transformation, [_, lang, template]) => Some(ParsedArtifactName {
            kind,
            target_language: (*lang).to_string(),
            template_name: Some((*template).to_string()),
        }),
        _ => None,
    }
}

/// Conventional file name for a fragment
///
/// Originals: `o~{hash}~{name}`. Derived variants carry the original's hash:
/// `t~{hash}~{source_hash}~{name}` (thumbnail) / `p~...` (preview). The full
/// hex digest in the name is what makes dedup-by-listing possible.
#[must_use]
pub fn fragment_file_name(
    variant: FragmentVariant,
    hash: &ContentHash,
    source_hash: Option<&ContentHash>,
    name: &str,
) -> String {
    let tag = variant_tag(variant);
    let safe_name = name.replace('~', "-");
    match source_hash {
        Some(source) => format!("{tag}~{hash}~{source}~{safe_name}"),
        None => format!("{tag}~{hash}~{safe_name}"),
    }
}

/// Fragment fields recovered from a conventional file name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFragmentName {
    pub variant: FragmentVariant,
    pub hash: ContentHash,
    pub source_hash: Option<ContentHash>,
    pub name: String,
}

/// Parse a conventional fragment file name
#[must_use]
pub fn parse_fragment_file_name(file_name: &str) -> Option<ParsedFragmentName> {
    let (tag, rest) = file_name.split_once('~')?;
    let variant = match tag {
        "o" => FragmentVariant::Original,
        "t" => FragmentVariant::Thumbnail,
        "p" => FragmentVariant::Preview,
        _ => return None,
    };
    let (hash_part, rest) = rest.split_once('~')?;
    let hash: ContentHash = hash_part.parse().ok()?;
    let (source_hash, name) = if variant.is_derived() {
        let (source_part, name) = rest.split_once('~')?;
        (Some(source_part.parse().ok()?), name)
    } else {
        (None, rest)
    };
    Some(ParsedFragmentName {
        variant,
        hash,
        source_hash,
        name: name.to_string(),
    })
}

const fn variant_tag(variant: FragmentVariant) -> &'static str {
    match variant {
        FragmentVariant::Original => "o",
        FragmentVariant::Thumbnail => "t",
        FragmentVariant::Preview => "p",
    }
}

/// MIME type guessed from a file name extension
#[must_use]
pub fn mime_for_name(name: &str) -> &'static str {
    let ext = name.rsplit('.').next().unwrap_or("");
    match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "ogg" => "audio/ogg",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "md" => "text/markdown",
        _ => "application/octet-stream",
    }
}

/// Media category for a MIME type
#[must_use]
pub fn fragment_kind_for_mime(mime: &str) -> Option<FragmentKind> {
    if mime.starts_with("image/") {
        Some(FragmentKind::Image)
    } else if mime.starts_with("audio/") {
        Some(FragmentKind::Audio)
    } else if mime.starts_with("video/") {
        Some(FragmentKind::Video)
    } else {
        None
    }
}

fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| match c {
            '.' | '/' | '\\' | '~' => '-',
            other => other,
        })
        .collect()
}
