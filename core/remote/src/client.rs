//! Remote store contract.
//!
//! The WebDAV transport itself lives outside this repository; the sync
//! engine only depends on this trait. The crate ships two implementations:
//! [`crate::MemoryRemote`] for tests and [`crate::DirRemote`] for a
//! directory acting as the remote (e.g. a davfs mount).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use tidepool_common::{DocId, EpochMillis, Result, Rev};

/// Connection settings for a remote store.
#[derive(Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Endpoint of the remote store (server URL or mount directory).
    pub server_url: String,
    /// Account name.
    pub username: String,
    /// Account password, already decrypted. Held in memory only.
    pub password: String,
    /// Directory on the remote under which Tidepool keeps its data.
    pub remote_dir: String,
}

impl fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("server_url", &self.server_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("remote_dir", &self.remote_dir)
            .finish()
    }
}

/// A document in its wire form: revision and modification stamp travel
/// with the body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: DocId,
    pub rev: Rev,
    pub last_modified: EpochMillis,
    pub body: Map<String, Value>,
}

/// One entry of a remote document listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocEntry {
    pub id: DocId,
    pub last_modified: EpochMillis,
}

/// A downloaded attachment: payload plus whatever shareable metadata the
/// remote carries for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteAttachment {
    pub data: Vec<u8>,
    pub metadata: Option<Map<String, Value>>,
}

/// Contract every remote store implementation must satisfy.
///
/// Calls execute one at a time from the sync engine; implementations do
/// not need internal request queuing. Listings are finite, one snapshot
/// per call.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Establish remote connectivity using the given settings.
    ///
    /// # Errors
    /// - Remote error if the endpoint is unreachable or rejects the
    ///   credentials
    async fn init(&self, config: &RemoteConfig) -> Result<()>;

    /// Upload a document, overwriting any remote copy with the same id.
    async fn upload_doc(&self, doc: &RemoteDocument) -> Result<()>;

    /// Download a document, or `None` if the remote has no copy.
    async fn download_doc(&self, id: &DocId) -> Result<Option<RemoteDocument>>;

    /// List all remote documents with their modification stamps.
    async fn list_docs(&self) -> Result<Vec<RemoteDocEntry>>;

    /// Upload an attachment's bytes and optional shareable metadata.
    async fn upload_attachment(
        &self,
        id: &str,
        data: &[u8],
        metadata: Option<&Map<String, Value>>,
    ) -> Result<()>;

    /// Download an attachment, or `None` if the remote has no copy.
    async fn download_attachment(&self, id: &str) -> Result<Option<RemoteAttachment>>;

    /// List all remote attachment ids.
    async fn list_attachments(&self) -> Result<Vec<String>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_debug_redacts_password() {
        let config = RemoteConfig {
            server_url: "https://dav.example.net".to_string(),
            username: "mara".to_string(),
            password: "hunter2".to_string(),
            remote_dir: "tidepool".to_string(),
        };

        let printed = format!("{:?}", config);
        assert!(printed.contains("[REDACTED]"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_remote_document_wire_form() {
        let doc = RemoteDocument {
            id: DocId::new("PLUGIN/clock").unwrap(),
            rev: Rev::new("2-ab12").unwrap(),
            last_modified: 1_700_000_000_000,
            body: Map::new(),
        };

        let json = serde_json::to_string(&doc).unwrap();
        let back: RemoteDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, doc);
    }
}
