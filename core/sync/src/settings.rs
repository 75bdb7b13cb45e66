//! The persisted sync configuration document.
//!
//! Settings live in the document store under a fixed sentinel id, like any
//! other document: explicit save through the optimistic-concurrency `put`,
//! read at engine startup and after every completed pass (the watermark).

use serde::{Deserialize, Serialize};

use tidepool_common::{DocId, EpochMillis, Error, Result};
use tidepool_store::DocumentStore;

/// Sentinel id of the configuration document.
pub const SETTINGS_DOC_ID: &str = "SYNC/config";

fn default_remote_dir() -> String {
    "tidepool".to_string()
}

/// Sync engine configuration, as stored in the settings document body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Whether background sync runs at all.
    pub enabled: bool,
    /// Interval between automatic passes, in seconds.
    pub sync_interval_secs: u64,
    /// Remote endpoint.
    pub server_url: String,
    /// Remote account name.
    pub username: String,
    /// Password ciphertext from the credential vault (base64). Never
    /// plaintext; `None` for unauthenticated remotes.
    pub password_encrypted: Option<String>,
    /// Watermark: everything remote at or below this stamp has been seen.
    #[serde(default)]
    pub last_sync_time: EpochMillis,
    /// Directory on the remote under which Tidepool keeps its data.
    #[serde(default = "default_remote_dir")]
    pub remote_dir: String,
}

impl SyncSettings {
    /// Settings document id.
    pub fn doc_id() -> DocId {
        // The sentinel is a valid id by construction.
        DocId::new(SETTINGS_DOC_ID).expect("sentinel id is non-empty")
    }

    /// Load settings from the store, or `None` if never configured.
    pub fn load(store: &DocumentStore) -> Result<Option<Self>> {
        match store.try_get(&Self::doc_id())? {
            Some(doc) => {
                let settings = serde_json::from_value(serde_json::Value::Object(doc.body))
                    .map_err(|e| Error::Serialization(e.to_string()))?;
                Ok(Some(settings))
            }
            None => Ok(None),
        }
    }

    /// Persist settings through the store's revisioned `put`.
    pub fn save(&self, store: &DocumentStore) -> Result<()> {
        let body = match serde_json::to_value(self)
            .map_err(|e| Error::Serialization(e.to_string()))?
        {
            serde_json::Value::Object(map) => map,
            _ => {
                return Err(Error::Serialization(
                    "Settings did not serialize to an object".to_string(),
                ))
            }
        };

        let id = Self::doc_id();
        let rev = store.try_get(&id)?.map(|doc| doc.rev);
        store.put(&id, rev.as_ref(), body)?;
        Ok(())
    }
}
