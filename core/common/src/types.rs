//! Core identifier and revision types used throughout Tidepool.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch. All modification stamps and the sync
/// watermark use this unit.
pub type EpochMillis = i64;

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> EpochMillis {
    chrono::Utc::now().timestamp_millis()
}

/// Unique identifier for a document.
///
/// Ids are grouped by path-like prefixes (e.g. `"PLUGIN/"`); the prefix set
/// that participates in sync is fixed by the sync engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocId(String);

impl DocId {
    /// Create a new DocId from a string.
    ///
    /// # Errors
    /// - Returns error if id is empty
    pub fn new(id: impl Into<String>) -> crate::Result<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(crate::Error::InvalidInput(
                "DocId cannot be empty".to_string(),
            ));
        }
        Ok(Self(id))
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this id falls under the given namespace prefix.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque revision token in the form `"<sequence>-<hex>"`.
///
/// The sequence increases by exactly 1 on every content-mutating write to
/// the same document. The suffix is random, compared only for equality and
/// never parsed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rev(String);

impl Rev {
    /// Parse and validate a revision string.
    ///
    /// # Errors
    /// - Returns error unless the value has the shape `"<digits>-<suffix>"`
    pub fn new(raw: impl Into<String>) -> crate::Result<Self> {
        let raw = raw.into();
        let well_formed = matches!(
            raw.split_once('-'),
            Some((seq, suffix)) if !suffix.is_empty() && seq.parse::<u64>().is_ok()
        );
        if !well_formed {
            return Err(crate::Error::InvalidInput(format!(
                "Malformed rev: {raw:?}"
            )));
        }
        Ok(Self(raw))
    }

    /// Build a revision from its parts.
    pub fn from_parts(sequence: u64, suffix: &str) -> Self {
        Self(format!("{sequence}-{suffix}"))
    }

    /// The monotonically increasing write counter.
    pub fn sequence(&self) -> u64 {
        // Shape is validated on construction.
        self.0
            .split_once('-')
            .and_then(|(seq, _)| seq.parse().ok())
            .unwrap_or(0)
    }

    /// Get the inner string value.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Rev {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_doc_id_creation() {
        let id = DocId::new("PLUGIN/translator").unwrap();
        assert_eq!(id.as_str(), "PLUGIN/translator");
        assert!(id.has_prefix("PLUGIN/"));
        assert!(!id.has_prefix("APP/"));
    }

    #[test]
    fn test_doc_id_empty_fails() {
        assert!(DocId::new("").is_err());
    }

    #[test]
    fn test_rev_parse() {
        let rev = Rev::new("3-9f2c41d8").unwrap();
        assert_eq!(rev.sequence(), 3);
        assert_eq!(rev.as_str(), "3-9f2c41d8");
    }

    #[test]
    fn test_rev_from_parts() {
        let rev = Rev::from_parts(7, "abcd");
        assert_eq!(rev.sequence(), 7);
        assert_eq!(rev.as_str(), "7-abcd");
    }

    #[test]
    fn test_rev_malformed_fails() {
        assert!(Rev::new("no-dash-digits").is_err());
        assert!(Rev::new("42").is_err());
        assert!(Rev::new("3-").is_err());
        assert!(Rev::new("").is_err());
    }

    #[test]
    fn test_rev_equality_includes_suffix() {
        let a = Rev::new("2-aa").unwrap();
        let b = Rev::new("2-bb").unwrap();
        assert_ne!(a, b);
        assert_eq!(a.sequence(), b.sequence());
    }

    #[test]
    fn test_doc_id_serde_roundtrip() {
        let id = DocId::new("APP/settings").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"APP/settings\"");
        let back: DocId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
