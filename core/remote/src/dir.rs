//! Directory-backed remote store.
//!
//! Treats a local directory as the remote: documents as JSON files under
//! `docs/`, attachments as raw files under `attachments/` with a
//! `.meta.json` sidecar. This is the shape a WebDAV share takes when it is
//! mounted into the filesystem (davfs, rclone mount), and it doubles as
//! the integration-test remote.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use tidepool_common::{DocId, Error, Result};

use crate::client::{
    RemoteAttachment, RemoteConfig, RemoteDocEntry, RemoteDocument, RemoteStore,
};

const DOCS_DIR: &str = "docs";
const ATTACHMENTS_DIR: &str = "attachments";
const META_SUFFIX: &str = ".meta.json";

/// Encode an id into a single path segment. Ids contain `/`, which must
/// not create subdirectories on the remote.
fn encode_id(id: &str) -> String {
    id.replace('%', "%25").replace('/', "%2F")
}

/// Reverse of [`encode_id`].
fn decode_id(segment: &str) -> String {
    segment.replace("%2F", "/").replace("%25", "%")
}

/// Remote store backed by a directory tree.
pub struct DirRemote {
    root: PathBuf,
}

impl DirRemote {
    /// Create a remote rooted at the given directory. The layout is
    /// prepared by [`RemoteStore::init`].
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn doc_path(&self, id: &DocId) -> PathBuf {
        self.root
            .join(DOCS_DIR)
            .join(format!("{}.json", encode_id(id.as_str())))
    }

    fn attachment_path(&self, id: &str) -> PathBuf {
        self.root.join(ATTACHMENTS_DIR).join(encode_id(id))
    }

    fn attachment_meta_path(&self, id: &str) -> PathBuf {
        self.root
            .join(ATTACHMENTS_DIR)
            .join(format!("{}{}", encode_id(id), META_SUFFIX))
    }
}

#[async_trait]
impl RemoteStore for DirRemote {
    async fn init(&self, _config: &RemoteConfig) -> Result<()> {
        fs::create_dir_all(self.root.join(DOCS_DIR)).await?;
        fs::create_dir_all(self.root.join(ATTACHMENTS_DIR)).await?;
        debug!(root = %self.root.display(), "directory remote initialized");
        Ok(())
    }

    async fn upload_doc(&self, doc: &RemoteDocument) -> Result<()> {
        let encoded =
            serde_json::to_vec(doc).map_err(|e| Error::Serialization(e.to_string()))?;
        fs::write(self.doc_path(&doc.id), encoded).await?;
        Ok(())
    }

    async fn download_doc(&self, id: &DocId) -> Result<Option<RemoteDocument>> {
        let path = self.doc_path(id);
        match fs::read(&path).await {
            Ok(raw) => {
                let doc = serde_json::from_slice(&raw)
                    .map_err(|e| Error::Serialization(e.to_string()))?;
                Ok(Some(doc))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_docs(&self) -> Result<Vec<RemoteDocEntry>> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(self.root.join(DOCS_DIR)).await?;

        while let Some(entry) = dir.next_entry().await? {
            let raw = fs::read(entry.path()).await?;
            let doc: RemoteDocument = serde_json::from_slice(&raw)
                .map_err(|e| Error::Serialization(e.to_string()))?;
            entries.push(RemoteDocEntry {
                id: doc.id,
                last_modified: doc.last_modified,
            });
        }

        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    async fn upload_attachment(
        &self,
        id: &str,
        data: &[u8],
        metadata: Option<&Map<String, Value>>,
    ) -> Result<()> {
        fs::write(self.attachment_path(id), data).await?;
        if let Some(metadata) = metadata {
            let encoded = serde_json::to_vec(metadata)
                .map_err(|e| Error::Serialization(e.to_string()))?;
            fs::write(self.attachment_meta_path(id), encoded).await?;
        }
        Ok(())
    }

    async fn download_attachment(&self, id: &str) -> Result<Option<RemoteAttachment>> {
        let data = match fs::read(self.attachment_path(id)).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let metadata = match fs::read(self.attachment_meta_path(id)).await {
            Ok(raw) => Some(
                serde_json::from_slice(&raw)
                    .map_err(|e| Error::Serialization(e.to_string()))?,
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Some(RemoteAttachment { data, metadata }))
    }

    async fn list_attachments(&self) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut dir = fs::read_dir(self.root.join(ATTACHMENTS_DIR)).await?;

        while let Some(entry) = dir.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.ends_with(META_SUFFIX) {
                continue;
            }
            ids.push(decode_id(name));
        }

        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tidepool_common::Rev;

    fn remote_config() -> RemoteConfig {
        RemoteConfig {
            server_url: "file://remote".to_string(),
            username: String::new(),
            password: String::new(),
            remote_dir: "tidepool".to_string(),
        }
    }

    fn sample_doc(id: &str, last_modified: i64) -> RemoteDocument {
        let mut body = Map::new();
        body.insert("k".to_string(), Value::String("v".to_string()));
        RemoteDocument {
            id: DocId::new(id).unwrap(),
            rev: Rev::new("1-ff").unwrap(),
            last_modified,
            body,
        }
    }

    #[test]
    fn test_id_encoding_roundtrip() {
        for id in ["PLUGIN/translator", "a%2Fb", "plain", "x%y/z"] {
            assert_eq!(decode_id(&encode_id(id)), id);
        }
        assert!(!encode_id("PLUGIN/translator").contains('/'));
    }

    #[tokio::test]
    async fn test_doc_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let remote = DirRemote::new(tmp.path());
        remote.init(&remote_config()).await.unwrap();

        let doc = sample_doc("PLUGIN/weather", 123);
        remote.upload_doc(&doc).await.unwrap();

        let fetched = remote.download_doc(&doc.id).await.unwrap();
        assert_eq!(fetched, Some(doc));

        let missing = DocId::new("PLUGIN/none").unwrap();
        assert!(remote.download_doc(&missing).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_docs() {
        let tmp = TempDir::new().unwrap();
        let remote = DirRemote::new(tmp.path());
        remote.init(&remote_config()).await.unwrap();

        remote.upload_doc(&sample_doc("PLUGIN/b", 2)).await.unwrap();
        remote.upload_doc(&sample_doc("PLUGIN/a", 1)).await.unwrap();

        let entries = remote.list_docs().await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id.as_str(), "PLUGIN/a");
        assert_eq!(entries[1].last_modified, 2);
    }

    #[tokio::test]
    async fn test_attachment_with_sidecar() {
        let tmp = TempDir::new().unwrap();
        let remote = DirRemote::new(tmp.path());
        remote.init(&remote_config()).await.unwrap();

        let mut metadata = Map::new();
        metadata.insert(
            "mime_type".to_string(),
            Value::String("image/png".to_string()),
        );
        remote
            .upload_attachment("icon-7", &[5, 6, 7], Some(&metadata))
            .await
            .unwrap();

        let ids = remote.list_attachments().await.unwrap();
        assert_eq!(ids, vec!["icon-7"]);

        let fetched = remote.download_attachment("icon-7").await.unwrap().unwrap();
        assert_eq!(fetched.data, vec![5, 6, 7]);
        assert_eq!(
            fetched.metadata.unwrap().get("mime_type").unwrap(),
            "image/png"
        );
    }

    #[tokio::test]
    async fn test_attachment_without_sidecar() {
        let tmp = TempDir::new().unwrap();
        let remote = DirRemote::new(tmp.path());
        remote.init(&remote_config()).await.unwrap();

        remote
            .upload_attachment("bare", &[1], None)
            .await
            .unwrap();

        let fetched = remote.download_attachment("bare").await.unwrap().unwrap();
        assert!(fetched.metadata.is_none());
    }
}
