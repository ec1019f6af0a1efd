//! Persisted artifact records

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;

/// A persisted derived document as read from a backend
///
/// `markdown` is the full text, frontmatter block included; `frontmatter` is
/// the parsed metadata for convenience. `id` is backend-native: an encoded
/// [`crate::ArtifactId`] for document-store records, a provider item handle
/// for drive records.
///
/// # Invariant
/// `markdown` is never empty on a record returned from a successful write;
/// empty-content writes are rejected before reaching any backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactRecord {
    /// Backend-native identifier
    pub id: String,
    /// Display name of the artifact
    pub name: String,
    /// Full markdown text, frontmatter included
    pub markdown: String,
    /// Parsed frontmatter metadata
    pub frontmatter: Mapping,
}

impl ArtifactRecord {
    /// Look up a frontmatter value by string key
    #[inline]
    #[must_use]
    pub fn frontmatter_value(&self, key: &str) -> Option<&serde_yaml::Value> {
        self.frontmatter.get(serde_yaml::Value::from(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontmatter_value_lookup() {
        let mut frontmatter = Mapping::new();
        frontmatter.insert("title".into(), "Weekly report".into());

        let record = ArtifactRecord {
            id: "item-1".to_string(),
            name: "transformation.de.report.md".to_string(),
            markdown: "# Report".to_string(),
            frontmatter,
        };

        assert_eq!(
            record.frontmatter_value("title").and_then(|v| v.as_str()),
            Some("Weekly report")
        );
        assert!(record.frontmatter_value("missing").is_none());
    }
}
