//! Opaque artifact identifier codec
//!
//! [`ArtifactId`] deterministically encodes `(namespace, key)` into an opaque
//! string and decodes it back without any external lookup. The document-store
//! backend addresses records directly by this id (no side index, no scan), and
//! any caller holding an id can validate "is this really a transformation for
//! template X" purely from the string.
//!
//! # Format
//! `tw1` followed by the lowercase hex encoding of length-prefixed UTF-8
//! fields (`{byte_len}:{field}`): namespace, source id, kind tag, target
//! language, and the template name when present. Length prefixes make the
//! encoding injective regardless of what characters the fields contain, and
//! hex keeps the result safe for URLs and database keys. Ids are persisted by
//! callers, so the format must stay stable across releases.

use crate::key::{ArtifactKey, ArtifactKind};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

const ID_PREFIX: &str = "tw1";

/// Opaque, deterministic artifact identifier
///
/// Equal keys always encode to equal ids (idempotent addressing). Drive-backend
/// ids are provider-native handles instead and do not decode.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// Encode a namespace and key into an opaque id
    #[must_use]
    pub fn encode(namespace: &str, key: &ArtifactKey) -> Self {
        let mut payload = Vec::new();
        for field in [
            namespace,
            &key.source_id,
            key.kind.as_str(),
            &key.target_language,
        ] {
            push_field(&mut payload, field);
        }
        if let Some(template) = &key.template_name {
            push_field(&mut payload, template);
        }
        Self(format!("{ID_PREFIX}{}", hex::encode(payload)))
    }

    /// Parse and validate an id string
    ///
    /// # Errors
    /// Returns [`IdentifierError`] for any string `encode` could not have
    /// produced.
    pub fn parse(s: &str) -> Result<Self, IdentifierError> {
        let id = Self(s.to_string());
        id.decode()?;
        Ok(id)
    }

    /// Recover the namespace and key this id was encoded from
    ///
    /// # Errors
    /// Returns [`IdentifierError`] if the string is not a valid encoding.
    pub fn decode(&self) -> Result<(String, ArtifactKey), IdentifierError> {
        let hex_part = self
            .0
            .strip_prefix(ID_PREFIX)
            .ok_or_else(|| IdentifierError::MissingPrefix(self.0.clone()))?;
        let payload = hex::decode(hex_part)?;

        let mut fields = Vec::new();
        let mut rest = payload.as_slice();
        while !rest.is_empty() {
            let (field, remaining) = take_field(rest)?;
            fields.push(field);
            rest = remaining;
        }

        let mut fields = fields.into_iter();
        let (namespace, source_id, kind_tag, target_language) =
            match (fields.next(), fields.next(), fields.next(), fields.next()) {
                (Some(ns), Some(src), Some(kind), Some(lang)) => (ns, src, kind, lang),
                _ => return Err(IdentifierError::FieldCount),
            };
        let template_name = fields.next();
        if fields.next().is_some() {
            return Err(IdentifierError::FieldCount);
        }

        let kind: ArtifactKind = kind_tag
            .parse()
            .map_err(|_| IdentifierError::UnknownKind(kind_tag))?;

        Ok((
            namespace,
            ArtifactKey {
                source_id,
                kind,
                target_language,
                template_name,
            },
        ))
    }

    /// The id as a string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn push_field(payload: &mut Vec<u8>, field: &str) {
    payload.extend_from_slice(field.len().to_string().as_bytes());
    payload.push(b':');
    payload.extend_from_slice(field.as_bytes());
}

/// Take one `{byte_len}:{field}` off the front of the payload
fn take_field(payload: &[u8]) -> Result<(String, &[u8]), IdentifierError> {
    let sep = payload
        .iter()
        .position(|&b| b == b':')
        .ok_or(IdentifierError::Truncated)?;
    let len: usize = std::str::from_utf8(&payload[..sep])
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or(IdentifierError::Truncated)?;
    let start = sep + 1;
    let end = start.checked_add(len).ok_or(IdentifierError::Truncated)?;
    if end > payload.len() {
        return Err(IdentifierError::Truncated);
    }
    let field = String::from_utf8(payload[start..end].to_vec())
        .map_err(|_| IdentifierError::Truncated)?;
    Ok((field, &payload[end..]))
}

impl Display for ArtifactId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ArtifactId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Errors decoding an opaque artifact id
///
/// All of these surface to callers as "malformed identifier"; the variants
/// exist for diagnostics, never for recovery branching.
#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    /// Missing or wrong version prefix
    #[error("identifier lacks the tw1 prefix: {0}")]
    MissingPrefix(String),

    /// Payload is not valid hex
    #[error("identifier payload is not hex: {0}")]
    HexDecode(#[from] hex::FromHexError),

    /// Payload ended mid-field or carried a bad length prefix
    #[error("identifier payload is truncated or malformed")]
    Truncated,

    /// Wrong number of fields for any known encoding
    #[error("identifier carries an unexpected number of fields")]
    FieldCount,

    /// Kind tag not recognised
    #[error("identifier carries unknown artifact kind: {0}")]
    UnknownKind(String),
}
