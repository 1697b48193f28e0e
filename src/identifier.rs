//! # Advisory Identifier Module
//!
//! Normalizes external content identifiers (IMDb title ids) into a canonical form
//! that is safe to use as a cache file name and as a URL path segment.
//!
//! Every `AdvisoryId` in the crate went through [`normalize`], so downstream code
//! can rely on it being exactly `tt` followed by 7 or 8 ASCII digits.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::error::Error as CrateError;

/// Prefix every canonical identifier starts with
pub const ID_PREFIX: &str = "tt";

static CANONICAL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^tt[0-9]{7,8}$").expect("identifier pattern is valid"));

/// Reasons an identifier is rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// Nothing left after trimming
    #[error("identifier is empty")]
    Empty,

    /// Contains path separators or traversal sequences
    #[error("identifier contains unsafe characters: {0:?}")]
    UnsafeCharacters(String),

    /// Does not match `tt` + 7-8 digits
    #[error("identifier does not match tt + 7-8 digits: {0:?}")]
    InvalidFormat(String),
}

impl From<IdentifierError> for CrateError {
    fn from(err: IdentifierError) -> Self {
        CrateError::InvalidIdentifier(err.to_string())
    }
}

/// Canonical advisory identifier, e.g. `tt0111161`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AdvisoryId(String);

impl AdvisoryId {
    /// The canonical string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw external identifier
///
/// Trims whitespace, prepends the `tt` prefix when it is missing and lowercases it.
/// Anything containing `..`, `/` or `\` is rejected before pattern matching.
pub fn normalize(raw: &str) -> Result<AdvisoryId, IdentifierError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IdentifierError::Empty);
    }

    if trimmed.contains("..") || trimmed.contains('/') || trimmed.contains('\\') {
        return Err(IdentifierError::UnsafeCharacters(trimmed.to_string()));
    }

    let has_prefix = trimmed
        .get(..ID_PREFIX.len())
        .is_some_and(|p| p.eq_ignore_ascii_case(ID_PREFIX));

    let candidate = if has_prefix {
        format!("{}{}", ID_PREFIX, &trimmed[ID_PREFIX.len()..])
    } else {
        format!("{}{}", ID_PREFIX, trimmed)
    };

    if !CANONICAL_ID.is_match(&candidate) {
        return Err(IdentifierError::InvalidFormat(trimmed.to_string()));
    }

    Ok(AdvisoryId(candidate))
}

impl FromStr for AdvisoryId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        normalize(s)
    }
}

impl TryFrom<&str> for AdvisoryId {
    type Error = IdentifierError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        normalize(value)
    }
}

impl AsRef<str> for AdvisoryId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdvisoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for AdvisoryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for AdvisoryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        normalize(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_canonical_ids() {
        assert_eq!(normalize("tt1234567").unwrap().as_str(), "tt1234567");
        assert_eq!(normalize("tt12345678").unwrap().as_str(), "tt12345678");
    }

    #[test]
    fn test_prepends_missing_prefix() {
        assert_eq!(normalize("1234567").unwrap().as_str(), "tt1234567");
        assert_eq!(normalize("  0111161 ").unwrap().as_str(), "tt0111161");
    }

    #[test]
    fn test_lowercases_prefix() {
        assert_eq!(normalize("TT1234567").unwrap().as_str(), "tt1234567");
        assert_eq!(normalize("Tt7654321").unwrap().as_str(), "tt7654321");
    }

    #[test]
    fn test_rejects_traversal() {
        assert!(matches!(
            normalize("../x"),
            Err(IdentifierError::UnsafeCharacters(_))
        ));
        assert!(matches!(
            normalize("tt123/../../x"),
            Err(IdentifierError::UnsafeCharacters(_))
        ));
        assert!(matches!(
            normalize("tt1234567\\.."),
            Err(IdentifierError::UnsafeCharacters(_))
        ));
        assert!(matches!(
            normalize("tt1234567/"),
            Err(IdentifierError::UnsafeCharacters(_))
        ));
    }

    #[test]
    fn test_rejects_bad_format() {
        for raw in [
            "tt123456",
            "tt123456789",
            "nm1234567",
            "tt12345a7",
            "ttt1234567",
            "tt 1234567",
            "tt1234567.json",
            "１２３４５６７",
        ] {
            assert!(
                matches!(normalize(raw), Err(IdentifierError::InvalidFormat(_))),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(normalize("   "), Err(IdentifierError::Empty));
        assert_eq!(normalize(""), Err(IdentifierError::Empty));
    }

    #[test]
    fn test_serde_revalidates() {
        let id: AdvisoryId = serde_json::from_str("\"TT1234567\"").unwrap();
        assert_eq!(id.as_str(), "tt1234567");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"tt1234567\"");
        assert!(serde_json::from_str::<AdvisoryId>("\"../etc/passwd\"").is_err());
    }
}
