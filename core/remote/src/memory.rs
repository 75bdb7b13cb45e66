//! In-memory remote store for testing.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use tidepool_common::{DocId, Error, Result};

use crate::client::{
    RemoteAttachment, RemoteConfig, RemoteDocEntry, RemoteDocument, RemoteStore,
};

/// In-memory remote store.
///
/// Useful for tests and development. All data is lost on drop. Specific
/// ids can be poisoned so that any operation touching them fails with a
/// Remote error, which is how the sync tests exercise per-item error
/// counting.
#[derive(Default)]
pub struct MemoryRemote {
    docs: RwLock<HashMap<String, RemoteDocument>>,
    attachments: RwLock<HashMap<String, RemoteAttachment>>,
    poisoned: RwLock<HashSet<String>>,
}

impl MemoryRemote {
    /// Create a new empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document as if another device had uploaded it.
    pub fn seed_doc(&self, doc: RemoteDocument) {
        self.docs
            .write()
            .unwrap()
            .insert(doc.id.as_str().to_string(), doc);
    }

    /// Seed an attachment as if another device had uploaded it.
    pub fn seed_attachment(&self, id: &str, data: Vec<u8>, metadata: Option<Map<String, Value>>) {
        self.attachments
            .write()
            .unwrap()
            .insert(id.to_string(), RemoteAttachment { data, metadata });
    }

    /// Make every operation touching `id` fail with a Remote error.
    pub fn poison(&self, id: &str) {
        self.poisoned.write().unwrap().insert(id.to_string());
    }

    /// Current remote copy of a document, if any.
    pub fn doc(&self, id: &str) -> Option<RemoteDocument> {
        self.docs.read().unwrap().get(id).cloned()
    }

    /// Current remote copy of an attachment, if any.
    pub fn attachment(&self, id: &str) -> Option<RemoteAttachment> {
        self.attachments.read().unwrap().get(id).cloned()
    }

    /// Number of documents held by the remote.
    pub fn doc_count(&self) -> usize {
        self.docs.read().unwrap().len()
    }

    fn check_poisoned(&self, id: &str) -> Result<()> {
        if self.poisoned.read().unwrap().contains(id) {
            return Err(Error::Remote(format!("injected failure for {}", id)));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn init(&self, _config: &RemoteConfig) -> Result<()> {
        Ok(())
    }

    async fn upload_doc(&self, doc: &RemoteDocument) -> Result<()> {
        self.check_poisoned(doc.id.as_str())?;
        self.docs
            .write()
            .unwrap()
            .insert(doc.id.as_str().to_string(), doc.clone());
        Ok(())
    }

    async fn download_doc(&self, id: &DocId) -> Result<Option<RemoteDocument>> {
        self.check_poisoned(id.as_str())?;
        Ok(self.docs.read().unwrap().get(id.as_str()).cloned())
    }

    async fn list_docs(&self) -> Result<Vec<RemoteDocEntry>> {
        let mut entries: Vec<RemoteDocEntry> = self
            .docs
            .read()
            .unwrap()
            .values()
            .map(|doc| RemoteDocEntry {
                id: doc.id.clone(),
                last_modified: doc.last_modified,
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    async fn upload_attachment(
        &self,
        id: &str,
        data: &[u8],
        metadata: Option<&Map<String, Value>>,
    ) -> Result<()> {
        self.check_poisoned(id)?;
        self.attachments.write().unwrap().insert(
            id.to_string(),
            RemoteAttachment {
                data: data.to_vec(),
                metadata: metadata.cloned(),
            },
        );
        Ok(())
    }

    async fn download_attachment(&self, id: &str) -> Result<Option<RemoteAttachment>> {
        self.check_poisoned(id)?;
        Ok(self.attachments.read().unwrap().get(id).cloned())
    }

    async fn list_attachments(&self) -> Result<Vec<String>> {
        let mut ids: Vec<String> = self.attachments.read().unwrap().keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
