//! YAML frontmatter codec
//!
//! Pure functions over markdown text: split a leading `---` fenced YAML block
//! from the body, reassemble it, and merge metadata patches while leaving the
//! body bytes untouched. Backends never hand-roll this split themselves.
//!
//! `parse` strips exactly one newline after the closing fence and `serialize`
//! adds exactly one back, so `serialize(parse(text))` preserves the body
//! byte-for-byte.

use serde_yaml::{Mapping, Value};

/// Split markdown into frontmatter metadata and body
///
/// Text without a valid leading fence (or with YAML that fails to parse as a
/// mapping) yields an empty mapping and the unmodified input as body.
#[must_use]
pub fn parse(markdown: &str) -> (Mapping, String) {
    let Some(rest) = markdown.strip_prefix("---") else {
        return (Mapping::new(), markdown.to_string());
    };
    let Some(fence) = rest.find("\n---") else {
        return (Mapping::new(), markdown.to_string());
    };

    let raw = &rest[..fence + 1];
    let after = &rest[fence + 4..];
    let body = after.strip_prefix('\n').unwrap_or(after);

    match serde_yaml::from_str::<Value>(raw) {
        Ok(Value::Mapping(mapping)) => (mapping, body.to_string()),
        // Not a mapping (or not YAML at all): leave the document alone.
        _ => (Mapping::new(), markdown.to_string()),
    }
}

/// Reassemble metadata and body into markdown text
///
/// Empty metadata serializes to the bare body with no fence.
///
/// # Errors
/// Returns [`FrontmatterError`] if the metadata cannot be encoded as YAML.
pub fn serialize(metadata: &Mapping, body: &str) -> Result<String, FrontmatterError> {
    if metadata.is_empty() {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml::to_string(metadata)?;
    Ok(format!("---\n{yaml}---\n{body}"))
}

/// Merge `patches` into the markdown's frontmatter
///
/// Unrelated keys and the body stay unchanged. A `null` patch value removes
/// the key.
///
/// # Errors
/// Returns [`FrontmatterError`] if the merged metadata cannot be re-encoded.
pub fn patch(markdown: &str, patches: &Mapping) -> Result<String, FrontmatterError> {
    let (mut metadata, body) = parse(markdown);
    for (key, value) in patches {
        if value.is_null() {
            metadata.remove(key);
        } else {
            metadata.insert(key.clone(), value.clone());
        }
    }
    serialize(&metadata, &body)
}

/// Errors re-encoding frontmatter
#[derive(Debug, thiserror::Error)]
#[error("frontmatter serialization failed: {0}")]
pub struct FrontmatterError(#[from] serde_yaml::Error);
