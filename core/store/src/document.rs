//! Document, sync-metadata and attachment-metadata records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tidepool_common::{DocId, EpochMillis, Rev};

/// A revisioned document: an opaque JSON map under a stable id.
///
/// The body is schema-free on purpose; the store never inspects it beyond
/// serialization. Consumers layer their own structure on top.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub rev: Rev,
    pub body: Map<String, Value>,
}

/// Out-of-band sync state for one document.
///
/// Lives in its own table so it can change without bumping the document
/// rev: flipping `cloud_synced` after an upload must not look like an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMeta {
    pub rev: Rev,
    pub last_modified: EpochMillis,
    pub cloud_synced: bool,
}

/// Extended metadata for one attachment.
///
/// The binary payload is immutable once written; this record is the only
/// part of an attachment that is updated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub mime_type: String,
    pub cloud_synced: bool,
    pub last_modified: EpochMillis,
    /// Arbitrary caller- or remote-supplied fields, carried verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AttachmentMeta {
    /// Fresh metadata for a newly posted attachment.
    pub fn new(mime_type: impl Into<String>, last_modified: EpochMillis) -> Self {
        Self {
            mime_type: mime_type.into(),
            cloud_synced: false,
            last_modified,
            extra: Map::new(),
        }
    }

    /// The shareable view uploaded with the attachment: mime type plus the
    /// extra fields, with internal sync state stripped.
    pub fn public_fields(&self) -> Map<String, Value> {
        let mut fields = self.extra.clone();
        fields.insert(
            "mime_type".to_string(),
            Value::String(self.mime_type.clone()),
        );
        fields
    }
}

/// Generate the successor revision for a document.
///
/// Sequence is previous + 1 (or 1 for a new document); the suffix is 16
/// random bytes in hex, compared only for equality.
pub fn next_rev(previous: Option<&Rev>) -> Rev {
    use rand::Rng;

    let sequence = previous.map(|r| r.sequence() + 1).unwrap_or(1);
    let suffix: u128 = rand::thread_rng().gen();
    Rev::from_parts(sequence, &format!("{suffix:032x}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_rev_new_document() {
        let rev = next_rev(None);
        assert_eq!(rev.sequence(), 1);
    }

    #[test]
    fn test_next_rev_increments_sequence() {
        let first = next_rev(None);
        let second = next_rev(Some(&first));
        let third = next_rev(Some(&second));

        assert_eq!(second.sequence(), 2);
        assert_eq!(third.sequence(), 3);
        assert_ne!(second, third);
    }

    #[test]
    fn test_next_rev_suffix_is_random() {
        let a = next_rev(None);
        let b = next_rev(None);
        assert_ne!(a, b);
    }

    #[test]
    fn test_public_fields_strip_sync_state() {
        let mut meta = AttachmentMeta::new("image/png", 1234);
        meta.cloud_synced = true;
        meta.extra
            .insert("width".to_string(), Value::Number(640.into()));

        let fields = meta.public_fields();
        assert_eq!(fields.get("mime_type").unwrap(), "image/png");
        assert_eq!(fields.get("width").unwrap(), 640);
        assert!(fields.get("cloud_synced").is_none());
        assert!(fields.get("last_modified").is_none());
    }
}
