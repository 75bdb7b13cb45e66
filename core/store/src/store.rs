//! SQLite-backed document store.
//!
//! Three keyspaces live in one database file: revisioned document bodies,
//! their out-of-band sync metadata, and binary attachments with an
//! extended-metadata table. Every multi-key mutation runs inside a single
//! SQLite transaction, so concurrent readers never observe a half-applied
//! write.

use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

use tidepool_common::{now_ms, DocId, Error, Result, Rev};

use crate::codec;
use crate::document::{next_rev, AttachmentMeta, Document, SyncMeta};

fn storage_err(e: rusqlite::Error) -> Error {
    Error::Storage(e.to_string())
}

/// Transactional store for documents, sync metadata and attachments.
///
/// The store owns all on-disk state. Its API is synchronous; callers that
/// need async composition wrap calls at their own layer.
pub struct DocumentStore {
    conn: Mutex<Connection>,
}

impl DocumentStore {
    /// Open (or create) a store at the given path.
    ///
    /// # Errors
    /// - Database creation or schema migration failure
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path).map_err(storage_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing and ephemeral use).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage_err)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                id   TEXT PRIMARY KEY,
                rev  TEXT NOT NULL,
                body TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS sync_meta (
                id   TEXT PRIMARY KEY,
                meta TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS attachments (
                id   TEXT PRIMARY KEY,
                data BLOB NOT NULL
            );

            CREATE TABLE IF NOT EXISTS attachment_meta (
                id   TEXT PRIMARY KEY,
                meta TEXT NOT NULL
            );
            "#,
        )
        .map_err(storage_err)?;
        Ok(())
    }

    // ── Documents ────────────────────────────────────────────────

    /// Get a document by id.
    ///
    /// # Errors
    /// - NotFound if the document does not exist
    pub fn get(&self, id: &DocId) -> Result<Document> {
        self.try_get(id)?
            .ok_or_else(|| Error::NotFound(format!("Document not found: {}", id)))
    }

    /// Get a document by id, or `None` if absent.
    pub fn try_get(&self, id: &DocId) -> Result<Option<Document>> {
        let conn = self.conn.lock().unwrap();
        let row = conn.query_row(
            "SELECT rev, body FROM documents WHERE id = ?1",
            params![id.as_str()],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        );

        match row {
            Ok((rev, body)) => Ok(Some(Document {
                id: id.clone(),
                rev: Rev::new(rev)?,
                body: codec::decode_body(&body)?,
            })),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Insert or update a document with optimistic concurrency control.
    ///
    /// `rev` must match the currently stored revision (or be `None` for a
    /// new document). On success a fresh revision is generated (sequence
    /// +1) and sync metadata is stamped
    /// `{rev, last_modified: now, cloud_synced: false}` in the same
    /// transaction.
    ///
    /// # Errors
    /// - Conflict carrying the stored rev on a stale or missing `rev`;
    ///   nothing is mutated in that case
    pub fn put(
        &self,
        id: &DocId,
        rev: Option<&Rev>,
        body: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Rev> {
        let encoded_body = codec::encode_body(&body)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(storage_err)?;

        let stored: Option<String> = match tx.query_row(
            "SELECT rev FROM documents WHERE id = ?1",
            params![id.as_str()],
            |row| row.get(0),
        ) {
            Ok(rev) => Some(rev),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(storage_err(e)),
        };

        let new_rev = match (&stored, rev) {
            (Some(current), Some(given)) if given.as_str() == current => next_rev(Some(given)),
            (Some(current), _) => {
                return Err(Error::Conflict {
                    id: id.to_string(),
                    current_rev: current.clone(),
                })
            }
            (None, None) => next_rev(None),
            (None, Some(_)) => {
                return Err(Error::Conflict {
                    id: id.to_string(),
                    current_rev: "none".to_string(),
                })
            }
        };

        let meta = SyncMeta {
            rev: new_rev.clone(),
            last_modified: now_ms(),
            cloud_synced: false,
        };

        tx.execute(
            "INSERT OR REPLACE INTO documents (id, rev, body) VALUES (?1, ?2, ?3)",
            params![id.as_str(), new_rev.as_str(), encoded_body],
        )
        .map_err(storage_err)?;
        tx.execute(
            "INSERT OR REPLACE INTO sync_meta (id, meta) VALUES (?1, ?2)",
            params![id.as_str(), codec::encode_sync_meta(&meta)?],
        )
        .map_err(storage_err)?;
        tx.commit().map_err(storage_err)?;

        debug!(id = %id, rev = %new_rev, "document written");
        Ok(new_rev)
    }

    /// Delete a document and its sync metadata atomically.
    ///
    /// # Errors
    /// - NotFound if the document does not exist
    pub fn remove(&self, id: &DocId) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(storage_err)?;

        let deleted = tx
            .execute(
                "DELETE FROM documents WHERE id = ?1",
                params![id.as_str()],
            )
            .map_err(storage_err)?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Document not found: {}", id)));
        }
        tx.execute(
            "DELETE FROM sync_meta WHERE id = ?1",
            params![id.as_str()],
        )
        .map_err(storage_err)?;
        tx.commit().map_err(storage_err)?;

        debug!(id = %id, "document removed");
        Ok(())
    }

    /// All documents whose id starts with `prefix`, ordered
    /// lexicographically by id. One finite snapshot.
    pub fn all_docs(&self, prefix: &str) -> Result<Vec<Document>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, rev, body FROM documents
                 WHERE substr(id, 1, length(?1)) = ?1 ORDER BY id",
            )
            .map_err(storage_err)?;

        let rows = stmt
            .query_map(params![prefix], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(storage_err)?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, rev, body) = row.map_err(storage_err)?;
            docs.push(Document {
                id: DocId::new(id)?,
                rev: Rev::new(rev)?,
                body: codec::decode_body(&body)?,
            });
        }
        Ok(docs)
    }

    /// Overwrite a document and its sync metadata with a remote version,
    /// in one transaction.
    ///
    /// This bypasses the revision check: the remote revision replaces the
    /// local lineage wholesale. Only the sync engine calls this.
    pub fn apply_remote(&self, doc: &Document, meta: &SyncMeta) -> Result<()> {
        let encoded_body = codec::encode_body(&doc.body)?;
        let encoded_meta = codec::encode_sync_meta(meta)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(storage_err)?;
        tx.execute(
            "INSERT OR REPLACE INTO documents (id, rev, body) VALUES (?1, ?2, ?3)",
            params![doc.id.as_str(), doc.rev.as_str(), encoded_body],
        )
        .map_err(storage_err)?;
        tx.execute(
            "INSERT OR REPLACE INTO sync_meta (id, meta) VALUES (?1, ?2)",
            params![doc.id.as_str(), encoded_meta],
        )
        .map_err(storage_err)?;
        tx.commit().map_err(storage_err)?;

        debug!(id = %doc.id, rev = %doc.rev, "remote version applied");
        Ok(())
    }

    // ── Sync metadata ────────────────────────────────────────────

    /// Read sync metadata without touching the document body.
    pub fn get_sync_meta(&self, id: &DocId) -> Result<Option<SyncMeta>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT meta FROM sync_meta WHERE id = ?1",
            params![id.as_str()],
            |row| row.get::<_, String>(0),
        ) {
            Ok(raw) => Ok(Some(codec::decode_sync_meta(&raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Write sync metadata without touching the document body or bumping
    /// its rev.
    pub fn set_sync_meta(&self, id: &DocId, meta: &SyncMeta) -> Result<()> {
        let encoded = codec::encode_sync_meta(meta)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO sync_meta (id, meta) VALUES (?1, ?2)",
            params![id.as_str(), encoded],
        )
        .map_err(storage_err)?;
        Ok(())
    }

    // ── Attachments ──────────────────────────────────────────────

    /// Get an attachment's binary payload.
    ///
    /// # Errors
    /// - NotFound if the attachment does not exist
    pub fn get_attachment(&self, id: &str) -> Result<Vec<u8>> {
        self.try_get_attachment(id)?
            .ok_or_else(|| Error::NotFound(format!("Attachment not found: {}", id)))
    }

    /// Get an attachment's binary payload, or `None` if absent.
    pub fn try_get_attachment(&self, id: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT data FROM attachments WHERE id = ?1",
            params![id],
            |row| row.get::<_, Vec<u8>>(0),
        ) {
            Ok(data) => Ok(Some(data)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Store an attachment under a caller-supplied id.
    ///
    /// Idempotent overwrite: re-posting the same id replaces the bytes and
    /// resets the extended metadata to `cloud_synced = false`, in one
    /// transaction.
    pub fn post_attachment(&self, id: &str, data: &[u8], mime_type: &str) -> Result<()> {
        if id.is_empty() {
            return Err(Error::InvalidInput(
                "Attachment id cannot be empty".to_string(),
            ));
        }

        let meta = AttachmentMeta::new(mime_type, now_ms());
        let encoded_meta = codec::encode_attachment_meta(&meta)?;

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(storage_err)?;
        tx.execute(
            "INSERT OR REPLACE INTO attachments (id, data) VALUES (?1, ?2)",
            params![id, data],
        )
        .map_err(storage_err)?;
        tx.execute(
            "INSERT OR REPLACE INTO attachment_meta (id, meta) VALUES (?1, ?2)",
            params![id, encoded_meta],
        )
        .map_err(storage_err)?;
        tx.commit().map_err(storage_err)?;

        debug!(id, size = data.len(), "attachment stored");
        Ok(())
    }

    /// Delete an attachment's bytes and extended metadata atomically.
    ///
    /// # Errors
    /// - NotFound if the attachment does not exist
    pub fn remove_attachment(&self, id: &str) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().map_err(storage_err)?;

        let deleted = tx
            .execute("DELETE FROM attachments WHERE id = ?1", params![id])
            .map_err(storage_err)?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Attachment not found: {}", id)));
        }
        tx.execute("DELETE FROM attachment_meta WHERE id = ?1", params![id])
            .map_err(storage_err)?;
        tx.commit().map_err(storage_err)?;
        Ok(())
    }

    /// Enumerate all raw attachment ids, ordered. The sync engine's
    /// range scan for unsynced-attachment discovery.
    pub fn attachment_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id FROM attachments ORDER BY id")
            .map_err(storage_err)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(storage_err)?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(storage_err)?);
        }
        Ok(ids)
    }

    /// Enumerate all extended-metadata ids, ordered. Kept separate from
    /// [`DocumentStore::attachment_ids`]: the two keyspaces can diverge
    /// when metadata is written ahead of a payload.
    pub fn attachment_meta_ids(&self) -> Result<Vec<String>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT id FROM attachment_meta ORDER BY id")
            .map_err(storage_err)?;
        let rows = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(storage_err)?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row.map_err(storage_err)?);
        }
        Ok(ids)
    }

    /// Read an attachment's extended metadata.
    pub fn get_attachment_meta(&self, id: &str) -> Result<Option<AttachmentMeta>> {
        let conn = self.conn.lock().unwrap();
        match conn.query_row(
            "SELECT meta FROM attachment_meta WHERE id = ?1",
            params![id],
            |row| row.get::<_, String>(0),
        ) {
            Ok(raw) => Ok(Some(codec::decode_attachment_meta(&raw)?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(storage_err(e)),
        }
    }

    /// Update an attachment's extended metadata in place. The binary
    /// payload is never touched.
    pub fn set_attachment_meta(&self, id: &str, meta: &AttachmentMeta) -> Result<()> {
        let encoded = codec::encode_attachment_meta(meta)?;
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO attachment_meta (id, meta) VALUES (?1, ?2)",
            params![id, encoded],
        )
        .map_err(storage_err)?;
        Ok(())
    }
}
