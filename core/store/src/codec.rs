//! Serialization boundary between typed records and their stored JSON form.
//!
//! All JSON text that crosses into or out of SQLite goes through these
//! functions, never through ad hoc parsing in the callers.

use serde_json::{Map, Value};

use tidepool_common::{Error, Result};

use crate::document::{AttachmentMeta, SyncMeta};

/// Encode a document body to its stored JSON text.
pub fn encode_body(body: &Map<String, Value>) -> Result<String> {
    serde_json::to_string(body).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode a stored JSON text into a document body.
pub fn decode_body(raw: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(raw).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode sync metadata to its stored JSON text.
pub fn encode_sync_meta(meta: &SyncMeta) -> Result<String> {
    serde_json::to_string(meta).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode stored JSON text into sync metadata.
pub fn decode_sync_meta(raw: &str) -> Result<SyncMeta> {
    serde_json::from_str(raw).map_err(|e| Error::Serialization(e.to_string()))
}

/// Encode attachment metadata to its stored JSON text.
pub fn encode_attachment_meta(meta: &AttachmentMeta) -> Result<String> {
    serde_json::to_string(meta).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode stored JSON text into attachment metadata.
pub fn decode_attachment_meta(raw: &str) -> Result<AttachmentMeta> {
    serde_json::from_str(raw).map_err(|e| Error::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_common::Rev;

    #[test]
    fn test_body_roundtrip() {
        let mut body = Map::new();
        body.insert("name".to_string(), Value::String("clipboard".to_string()));
        body.insert("pinned".to_string(), Value::Bool(true));

        let encoded = encode_body(&body).unwrap();
        let decoded = decode_body(&encoded).unwrap();
        assert_eq!(decoded, body);
    }

    #[test]
    fn test_sync_meta_roundtrip() {
        let meta = SyncMeta {
            rev: Rev::new("4-1f2e3d4c").unwrap(),
            last_modified: 1_700_000_000_000,
            cloud_synced: true,
        };

        let encoded = encode_sync_meta(&meta).unwrap();
        let decoded = decode_sync_meta(&encoded).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn test_attachment_meta_extra_fields_survive() {
        let raw = r#"{"mime_type":"image/png","cloud_synced":false,"last_modified":7,"origin":"screenshot"}"#;
        let meta = decode_attachment_meta(raw).unwrap();
        assert_eq!(meta.extra.get("origin").unwrap(), "screenshot");

        let reencoded = encode_attachment_meta(&meta).unwrap();
        let again = decode_attachment_meta(&reencoded).unwrap();
        assert_eq!(again, meta);
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode_body("{not json").is_err());
        assert!(decode_sync_meta("[]").is_err());
    }
}
