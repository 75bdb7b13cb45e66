//! Core sync engine orchestrating upload, download and conflict
//! resolution between the local document store and a remote store.

use std::collections::HashSet;
use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, error, info, warn};

use tidepool_common::{now_ms, DocId, EpochMillis, Error, Result};
use tidepool_crypto::CredentialVault;
use tidepool_remote::{RemoteConfig, RemoteDocument, RemoteStore};
use tidepool_store::{AttachmentMeta, Document, DocumentStore, SyncMeta};

use crate::conflict::{is_conflict, resolve_lww, ConflictWinner};
use crate::retry::{RetryConfig, RetryExecutor};
use crate::scheduler::SyncTimer;
use crate::settings::SyncSettings;

/// Namespaces that participate in sync. Documents outside these prefixes
/// never leave the device.
pub const SYNC_PREFIXES: &[&str] = &["APP/settings", "APP/pinned", "PLUGIN/"];

/// Outcome of one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Documents and attachments pushed to the remote.
    pub uploaded: usize,
    /// Documents and attachments pulled from the remote.
    pub downloaded: usize,
    /// Last-Write-Wins resolutions performed. The winning copy is also
    /// counted under uploaded or downloaded.
    pub conflicts: usize,
    /// Items that failed; the pass continues past each one.
    pub errors: usize,
}

#[derive(Debug, Default)]
struct StageTotals {
    uploaded: usize,
    downloaded: usize,
    conflicts: usize,
    errors: usize,
}

impl StageTotals {
    fn absorb(&mut self, other: StageTotals) {
        self.uploaded += other.uploaded;
        self.downloaded += other.downloaded;
        self.conflicts += other.conflicts;
        self.errors += other.errors;
    }
}

enum UploadOutcome {
    Uploaded,
    ConflictLocalWon,
    ConflictRemoteWon,
}

enum DownloadOutcome {
    Inserted,
    Overwritten,
    ConflictLocalWon,
    ConflictRemoteWon,
    Skipped,
}

/// Synchronization engine for one local replica.
///
/// Constructed once at process start with its collaborators injected;
/// shut down explicitly through [`SyncEngine::stop_auto_sync`].
pub struct SyncEngine {
    store: Arc<DocumentStore>,
    remote: Arc<dyn RemoteStore>,
    credentials: Arc<dyn CredentialVault>,
    retry: RetryExecutor,
    /// Serializes passes; timer ticks skip when it is held.
    pass_guard: AsyncMutex<()>,
    timer: StdMutex<Option<SyncTimer>>,
}

impl SyncEngine {
    /// Create a new sync engine with default retry behavior.
    pub fn new(
        store: Arc<DocumentStore>,
        remote: Arc<dyn RemoteStore>,
        credentials: Arc<dyn CredentialVault>,
    ) -> Self {
        Self::with_retry(store, remote, credentials, RetryConfig::default())
    }

    /// Create a new sync engine with explicit retry behavior.
    pub fn with_retry(
        store: Arc<DocumentStore>,
        remote: Arc<dyn RemoteStore>,
        credentials: Arc<dyn CredentialVault>,
        retry: RetryConfig,
    ) -> Self {
        Self {
            store,
            remote,
            credentials,
            retry: RetryExecutor::new(retry),
            pass_guard: AsyncMutex::new(()),
            timer: StdMutex::new(None),
        }
    }

    /// Initialize the engine from the persisted settings document.
    ///
    /// Returns `false` (and stays idle) when sync is not configured or not
    /// enabled. Decrypts the stored password, connects the remote store
    /// and arms the periodic timer.
    ///
    /// # Errors
    /// - Crypto error if the credential cannot be decrypted; the engine
    ///   stays idle rather than running unauthenticated
    /// - Remote error if the remote store rejects the connection
    pub async fn init(self: Arc<Self>) -> Result<bool> {
        let Some(settings) = SyncSettings::load(&self.store)? else {
            info!("Sync not configured");
            return Ok(false);
        };
        if !settings.enabled {
            info!("Sync disabled");
            return Ok(false);
        }

        let password = match &settings.password_encrypted {
            Some(ciphertext) => {
                if !self.credentials.is_available() {
                    return Err(Error::Crypto(
                        "Secure credential storage is unavailable".to_string(),
                    ));
                }
                self.credentials.decrypt_string(ciphertext)?
            }
            None => String::new(),
        };

        let config = RemoteConfig {
            server_url: settings.server_url.clone(),
            username: settings.username.clone(),
            password,
            remote_dir: settings.remote_dir.clone(),
        };
        self.remote.init(&config).await?;

        Arc::clone(&self).start_auto_sync(Duration::from_secs(settings.sync_interval_secs));
        info!(
            "Sync engine initialized, interval {}s",
            settings.sync_interval_secs
        );
        Ok(true)
    }

    /// Persist sync settings, encrypting the password through the
    /// credential vault.
    pub fn save_settings(&self, mut settings: SyncSettings, password: Option<&str>) -> Result<()> {
        if let Some(password) = password {
            if !self.credentials.is_available() {
                return Err(Error::Crypto(
                    "Secure credential storage is unavailable".to_string(),
                ));
            }
            settings.password_encrypted = Some(self.credentials.encrypt_string(password)?);
        }
        settings.save(&self.store)
    }

    /// Arm (or re-arm) the periodic sync timer.
    pub fn start_auto_sync(self: Arc<Self>, interval: Duration) {
        let engine = Arc::downgrade(&self);
        let timer = SyncTimer::spawn(interval, move || {
            let engine = engine.upgrade();
            async move {
                if let Some(engine) = engine {
                    engine.try_sync().await;
                }
            }
        });
        *self.timer.lock().unwrap() = Some(timer);
    }

    /// Cancel the periodic timer. A pass already in flight runs to
    /// completion.
    pub fn stop_auto_sync(&self) {
        if let Some(timer) = self.timer.lock().unwrap().take() {
            timer.stop();
        }
    }

    /// Whether the periodic timer is armed.
    pub fn is_auto_sync_running(&self) -> bool {
        self.timer
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }

    /// Run a full sync pass, waiting if one is already in progress.
    pub async fn perform_sync(&self) -> Result<SyncReport> {
        let _guard = self.pass_guard.lock().await;
        Ok(self.run_pass().await)
    }

    /// Run a full sync pass unless one is already in progress, in which
    /// case the call is skipped. The timer tick path.
    pub async fn try_sync(&self) -> Option<SyncReport> {
        match self.pass_guard.try_lock() {
            Ok(_guard) => Some(self.run_pass().await),
            Err(_) => {
                warn!("Sync pass already running; skipping this tick");
                None
            }
        }
    }

    /// Download every remote document and unconditionally overwrite the
    /// local copy. The "reset this device from the cloud" recovery path;
    /// conflict rules do not apply.
    pub async fn force_download_from_cloud(&self) -> Result<SyncReport> {
        let _guard = self.pass_guard.lock().await;
        info!("Starting forced download from remote");

        let entries = self.retry.execute(|| self.remote.list_docs()).await?;
        info!("{} remote documents to force-download", entries.len());

        let mut report = SyncReport::default();
        for entry in entries {
            match self.force_pull(&entry.id).await {
                Ok(true) => report.downloaded += 1,
                Ok(false) => {
                    warn!(id = %entry.id, "Listed document could not be downloaded");
                    report.errors += 1;
                }
                Err(e) => {
                    error!(id = %entry.id, "Forced download failed: {}", e);
                    report.errors += 1;
                }
            }
        }

        if let Err(e) = self.advance_watermark() {
            error!("Failed to advance watermark: {}", e);
            report.errors += 1;
        }

        info!(?report, "Forced download finished");
        Ok(report)
    }

    // ── Pass pipeline ────────────────────────────────────────────

    /// The five stages in fixed order: upload docs, upload attachments,
    /// download docs, download attachments, advance the watermark. Stage 3
    /// depends on stage 1's processed-id set; the watermark only moves
    /// after everything else ran.
    async fn run_pass(&self) -> SyncReport {
        info!("Starting sync pass");
        let watermark = self.watermark();

        let (mut totals, processed) = self.upload_documents().await;
        totals.absorb(self.upload_attachments().await);
        totals.absorb(self.download_documents(watermark, &processed).await);
        totals.absorb(self.download_attachments().await);

        if let Err(e) = self.advance_watermark() {
            error!("Failed to advance watermark: {}", e);
            totals.errors += 1;
        }

        let report = SyncReport {
            uploaded: totals.uploaded,
            downloaded: totals.downloaded,
            conflicts: totals.conflicts,
            errors: totals.errors,
        };
        info!(?report, "Sync pass finished");
        report
    }

    fn watermark(&self) -> EpochMillis {
        match SyncSettings::load(&self.store) {
            Ok(settings) => settings.map(|s| s.last_sync_time).unwrap_or(0),
            Err(e) => {
                warn!("Failed to load settings for watermark: {}", e);
                0
            }
        }
    }

    fn advance_watermark(&self) -> Result<()> {
        if let Some(mut settings) = SyncSettings::load(&self.store)? {
            settings.last_sync_time = now_ms();
            settings.save(&self.store)?;
        }
        Ok(())
    }

    // ── Stage 1: upload local documents ──────────────────────────

    async fn upload_documents(&self) -> (StageTotals, HashSet<DocId>) {
        let mut totals = StageTotals::default();
        let mut processed = HashSet::new();

        let candidates = match self.unsynced_documents() {
            Ok(candidates) => candidates,
            Err(e) => {
                error!("Failed to scan for unsynced documents: {}", e);
                totals.errors += 1;
                return (totals, processed);
            }
        };

        if candidates.is_empty() {
            debug!("No documents pending upload");
            return (totals, processed);
        }
        info!("{} documents pending upload", candidates.len());

        for (doc, meta) in candidates {
            if processed.contains(&doc.id) {
                continue;
            }
            match self.upload_one(&doc, &meta).await {
                Ok(UploadOutcome::Uploaded) => {
                    debug!(id = %doc.id, "Uploaded");
                    totals.uploaded += 1;
                    processed.insert(doc.id);
                }
                Ok(UploadOutcome::ConflictLocalWon) => {
                    info!(id = %doc.id, "Conflict resolved: local copy won, re-uploaded");
                    totals.uploaded += 1;
                    totals.conflicts += 1;
                    processed.insert(doc.id);
                }
                Ok(UploadOutcome::ConflictRemoteWon) => {
                    info!(id = %doc.id, "Conflict resolved: remote copy won, overwrote local");
                    totals.downloaded += 1;
                    totals.conflicts += 1;
                    processed.insert(doc.id);
                }
                Err(e) => {
                    error!(id = %doc.id, "Upload failed: {}", e);
                    totals.errors += 1;
                }
            }
        }

        (totals, processed)
    }

    /// Documents under the sync prefixes whose metadata says they have not
    /// been mirrored yet. Absence of metadata counts as unsynced.
    fn unsynced_documents(&self) -> Result<Vec<(Document, SyncMeta)>> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();

        for prefix in SYNC_PREFIXES {
            for doc in self.store.all_docs(prefix)? {
                if !seen.insert(doc.id.clone()) {
                    continue;
                }
                let meta = self.store.get_sync_meta(&doc.id)?;
                if meta.as_ref().is_some_and(|m| m.cloud_synced) {
                    continue;
                }
                let meta = meta.unwrap_or_else(|| SyncMeta {
                    rev: doc.rev.clone(),
                    last_modified: now_ms(),
                    cloud_synced: false,
                });
                out.push((doc, meta));
            }
        }

        Ok(out)
    }

    async fn upload_one(&self, doc: &Document, meta: &SyncMeta) -> Result<UploadOutcome> {
        // Probe the remote copy before pushing.
        let remote_doc = self
            .retry
            .execute(|| self.remote.download_doc(&doc.id))
            .await?;

        if let Some(remote_doc) = remote_doc {
            if is_conflict(
                !meta.cloud_synced,
                meta.last_modified,
                remote_doc.last_modified,
            ) {
                return match resolve_lww(meta.last_modified, remote_doc.last_modified) {
                    ConflictWinner::Local => {
                        self.push_document(doc).await?;
                        Ok(UploadOutcome::ConflictLocalWon)
                    }
                    ConflictWinner::Remote => {
                        self.pull_document(&remote_doc)?;
                        Ok(UploadOutcome::ConflictRemoteWon)
                    }
                };
            }
        }

        self.push_document(doc).await?;
        Ok(UploadOutcome::Uploaded)
    }

    /// Upload a local document with a fresh modification stamp, then mark
    /// it synced.
    async fn push_document(&self, doc: &Document) -> Result<()> {
        let stamped = now_ms();
        let wire = RemoteDocument {
            id: doc.id.clone(),
            rev: doc.rev.clone(),
            last_modified: stamped,
            body: doc.body.clone(),
        };
        self.retry.execute(|| self.remote.upload_doc(&wire)).await?;

        // Re-read before marking synced; the upload may have been slow.
        if let Some(current) = self.store.try_get(&doc.id)? {
            self.store.set_sync_meta(
                &doc.id,
                &SyncMeta {
                    rev: current.rev,
                    last_modified: stamped,
                    cloud_synced: true,
                },
            )?;
        }
        Ok(())
    }

    /// Overwrite the local copy with a remote version and mark it synced.
    fn pull_document(&self, remote: &RemoteDocument) -> Result<()> {
        let doc = Document {
            id: remote.id.clone(),
            rev: remote.rev.clone(),
            body: remote.body.clone(),
        };
        let meta = SyncMeta {
            rev: remote.rev.clone(),
            last_modified: remote.last_modified,
            cloud_synced: true,
        };
        self.store.apply_remote(&doc, &meta)
    }

    // ── Stage 2: upload local attachments ────────────────────────

    async fn upload_attachments(&self) -> StageTotals {
        let mut totals = StageTotals::default();
        debug!("Scanning local attachments");

        let ids = match self.store.attachment_ids() {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to scan local attachments: {}", e);
                totals.errors += 1;
                return totals;
            }
        };

        for id in ids {
            match self.upload_one_attachment(&id).await {
                Ok(true) => {
                    debug!(%id, "Attachment uploaded");
                    totals.uploaded += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(%id, "Attachment upload failed: {}", e);
                    totals.errors += 1;
                }
            }
        }

        totals
    }

    /// Returns whether the attachment was uploaded (false = already
    /// synced or payload missing).
    async fn upload_one_attachment(&self, id: &str) -> Result<bool> {
        let meta = self.store.get_attachment_meta(id)?;
        if meta.as_ref().is_some_and(|m| m.cloud_synced) {
            return Ok(false);
        }

        let Some(data) = self.store.try_get_attachment(id)? else {
            warn!(id, "Attachment has metadata but no payload; skipping");
            return Ok(false);
        };

        // Internal sync fields stay local; only the shareable view goes up.
        let public = meta.as_ref().map(|m| m.public_fields());
        self.retry
            .execute(|| self.remote.upload_attachment(id, &data, public.as_ref()))
            .await?;

        let mut updated =
            meta.unwrap_or_else(|| AttachmentMeta::new("application/octet-stream", 0));
        updated.cloud_synced = true;
        updated.last_modified = now_ms();
        self.store.set_attachment_meta(id, &updated)?;
        Ok(true)
    }

    // ── Stage 3: download remote documents ───────────────────────

    async fn download_documents(
        &self,
        watermark: EpochMillis,
        processed: &HashSet<DocId>,
    ) -> StageTotals {
        let mut totals = StageTotals::default();

        let entries = match self.retry.execute(|| self.remote.list_docs()).await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to list remote documents: {}", e);
                totals.errors += 1;
                return totals;
            }
        };

        let pending: Vec<_> = entries
            .into_iter()
            .filter(|e| e.last_modified > watermark && !processed.contains(&e.id))
            .collect();

        if pending.is_empty() {
            debug!("No new remote documents");
            return totals;
        }
        info!("{} remote documents to download", pending.len());

        for entry in pending {
            match self.download_one(&entry.id).await {
                Ok(DownloadOutcome::Inserted) => {
                    debug!(id = %entry.id, "Downloaded new document");
                    totals.downloaded += 1;
                }
                Ok(DownloadOutcome::Overwritten) => {
                    debug!(id = %entry.id, "Downloaded update");
                    totals.downloaded += 1;
                }
                Ok(DownloadOutcome::ConflictLocalWon) => {
                    info!(id = %entry.id, "Conflict resolved: local copy won, re-uploaded");
                    totals.uploaded += 1;
                    totals.conflicts += 1;
                }
                Ok(DownloadOutcome::ConflictRemoteWon) => {
                    info!(id = %entry.id, "Conflict resolved: remote copy won, overwrote local");
                    totals.downloaded += 1;
                    totals.conflicts += 1;
                }
                Ok(DownloadOutcome::Skipped) => {}
                Err(e) => {
                    error!(id = %entry.id, "Download failed: {}", e);
                    totals.errors += 1;
                }
            }
        }

        totals
    }

    async fn download_one(&self, id: &DocId) -> Result<DownloadOutcome> {
        let Some(remote_doc) = self
            .retry
            .execute(|| self.remote.download_doc(id))
            .await?
        else {
            return Ok(DownloadOutcome::Skipped);
        };

        if self.store.try_get(id)?.is_none() {
            self.pull_document(&remote_doc)?;
            return Ok(DownloadOutcome::Inserted);
        }

        let meta = self.store.get_sync_meta(id)?;
        let local_modified = meta.as_ref().map(|m| m.last_modified).unwrap_or(0);
        if remote_doc.last_modified <= local_modified {
            return Ok(DownloadOutcome::Skipped);
        }

        let locally_edited = meta.as_ref().is_some_and(|m| !m.cloud_synced);
        if locally_edited {
            // Same rule as the upload stage.
            match resolve_lww(local_modified, remote_doc.last_modified) {
                ConflictWinner::Local => {
                    let local = self.store.get(id)?;
                    self.push_document(&local).await?;
                    Ok(DownloadOutcome::ConflictLocalWon)
                }
                ConflictWinner::Remote => {
                    self.pull_document(&remote_doc)?;
                    Ok(DownloadOutcome::ConflictRemoteWon)
                }
            }
        } else {
            self.pull_document(&remote_doc)?;
            Ok(DownloadOutcome::Overwritten)
        }
    }

    // ── Stage 4: download remote attachments ─────────────────────

    async fn download_attachments(&self) -> StageTotals {
        let mut totals = StageTotals::default();
        debug!("Scanning remote attachments");

        let ids = match self.retry.execute(|| self.remote.list_attachments()).await {
            Ok(ids) => ids,
            Err(e) => {
                error!("Failed to list remote attachments: {}", e);
                totals.errors += 1;
                return totals;
            }
        };

        for id in ids {
            match self.download_one_attachment(&id).await {
                Ok(true) => {
                    debug!(%id, "Attachment downloaded");
                    totals.downloaded += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    error!(%id, "Attachment download failed: {}", e);
                    totals.errors += 1;
                }
            }
        }

        totals
    }

    /// Returns whether the attachment was downloaded (false = already
    /// present locally, which is final: payloads are immutable).
    async fn download_one_attachment(&self, id: &str) -> Result<bool> {
        if self.store.try_get_attachment(id)?.is_some() {
            debug!(id, "Attachment already present; skipping");
            return Ok(false);
        }

        let Some(attachment) = self
            .retry
            .execute(|| self.remote.download_attachment(id))
            .await?
        else {
            warn!(id, "Listed attachment could not be downloaded");
            return Ok(false);
        };

        let mime_type = attachment
            .metadata
            .as_ref()
            .and_then(|m| m.get("mime_type"))
            .and_then(|v| v.as_str())
            .unwrap_or("application/octet-stream")
            .to_string();

        self.store
            .post_attachment(id, &attachment.data, &mime_type)?;

        let mut meta = self
            .store
            .get_attachment_meta(id)?
            .unwrap_or_else(|| AttachmentMeta::new(mime_type.clone(), 0));
        if let Some(remote_meta) = &attachment.metadata {
            for (key, value) in remote_meta {
                if key != "mime_type" {
                    meta.extra.insert(key.clone(), value.clone());
                }
            }
        }
        meta.cloud_synced = true;
        meta.last_modified = now_ms();
        self.store.set_attachment_meta(id, &meta)?;
        Ok(true)
    }

    async fn force_pull(&self, id: &DocId) -> Result<bool> {
        let Some(remote_doc) = self
            .retry
            .execute(|| self.remote.download_doc(id))
            .await?
        else {
            return Ok(false);
        };
        self.pull_document(&remote_doc)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tidepool_crypto::{AeadCredentialVault, DeviceKey};
    use tidepool_remote::MemoryRemote;

    fn engine_with(
        store: Arc<DocumentStore>,
        remote: Arc<MemoryRemote>,
    ) -> (Arc<SyncEngine>, Arc<AeadCredentialVault>) {
        let vault = Arc::new(AeadCredentialVault::new(DeviceKey::generate()));
        let engine = Arc::new(SyncEngine::with_retry(
            store,
            remote,
            vault.clone(),
            RetryConfig::none(),
        ));
        (engine, vault)
    }

    fn body(key: &str, value: &str) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        map.insert(
            key.to_string(),
            serde_json::Value::String(value.to_string()),
        );
        map
    }

    #[tokio::test]
    async fn test_unsynced_scan_honors_prefixes_and_flags() {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let remote = Arc::new(MemoryRemote::new());
        let (engine, _) = engine_with(store.clone(), remote);

        let synced_id = DocId::new("PLUGIN/synced").unwrap();
        let rev = store.put(&synced_id, None, body("k", "v")).unwrap();
        store
            .set_sync_meta(
                &synced_id,
                &SyncMeta {
                    rev,
                    last_modified: 1,
                    cloud_synced: true,
                },
            )
            .unwrap();

        store
            .put(&DocId::new("PLUGIN/dirty").unwrap(), None, body("k", "v"))
            .unwrap();
        store
            .put(&DocId::new("PRIVATE/doc").unwrap(), None, body("k", "v"))
            .unwrap();

        let candidates = engine.unsynced_documents().unwrap();
        let ids: Vec<&str> = candidates.iter().map(|(d, _)| d.id.as_str()).collect();
        assert_eq!(ids, vec!["PLUGIN/dirty"]);
    }

    #[tokio::test]
    async fn test_save_settings_encrypts_password() {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let remote = Arc::new(MemoryRemote::new());
        let (engine, vault) = engine_with(store.clone(), remote);

        let settings = SyncSettings {
            enabled: true,
            sync_interval_secs: 300,
            server_url: "https://dav.example.net".to_string(),
            username: "mara".to_string(),
            password_encrypted: None,
            last_sync_time: 0,
            remote_dir: "tidepool".to_string(),
        };
        engine.save_settings(settings, Some("hunter2")).unwrap();

        let loaded = SyncSettings::load(&store).unwrap().unwrap();
        let ciphertext = loaded.password_encrypted.unwrap();
        assert_ne!(ciphertext, "hunter2");
        assert_eq!(vault.decrypt_string(&ciphertext).unwrap(), "hunter2");
    }

    #[tokio::test]
    async fn test_init_without_settings_stays_idle() {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let remote = Arc::new(MemoryRemote::new());
        let (engine, _) = engine_with(store, remote);

        assert!(!engine.clone().init().await.unwrap());
        assert!(!engine.is_auto_sync_running());
    }

    #[tokio::test]
    async fn test_init_with_undecryptable_credential_fails() {
        let store = Arc::new(DocumentStore::open_in_memory().unwrap());
        let remote = Arc::new(MemoryRemote::new());
        let (engine, _) = engine_with(store.clone(), remote);

        let settings = SyncSettings {
            enabled: true,
            sync_interval_secs: 300,
            server_url: "https://dav.example.net".to_string(),
            username: "mara".to_string(),
            // Not produced by this device's vault.
            password_encrypted: Some("AAAABBBBCCCC".to_string()),
            last_sync_time: 0,
            remote_dir: "tidepool".to_string(),
        };
        settings.save(&store).unwrap();

        assert!(matches!(engine.clone().init().await, Err(Error::Crypto(_))));
        assert!(!engine.is_auto_sync_running());
    }
}
