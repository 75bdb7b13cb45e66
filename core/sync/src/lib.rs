//! Tidepool sync engine.
//!
//! Mirrors the local document store against a remote store:
//! - Five-stage sync pass: upload documents, upload attachments, download
//!   documents, download attachments, advance the watermark
//! - Last-Write-Wins conflict resolution on modification stamps
//! - Retry strategy with exponential backoff for transient remote errors
//! - Periodic timer with explicit shutdown and a reentrancy guard

pub mod conflict;
pub mod engine;
pub mod retry;
pub mod scheduler;
pub mod settings;

pub use conflict::{is_conflict, resolve_lww, ConflictWinner};
pub use engine::{SyncEngine, SyncReport, SYNC_PREFIXES};
pub use retry::{RetryConfig, RetryExecutor};
pub use scheduler::SyncTimer;
pub use settings::{SyncSettings, SETTINGS_DOC_ID};
