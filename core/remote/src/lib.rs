//! Remote store abstraction for Tidepool.
//!
//! Defines the contract the sync engine consumes, plus two reference
//! implementations: an in-memory remote for tests and a directory-backed
//! remote for mounted shares. The real WebDAV HTTP transport implements
//! the same trait outside this repository.

pub mod client;
pub mod dir;
pub mod memory;

pub use client::{
    RemoteAttachment, RemoteConfig, RemoteDocEntry, RemoteDocument, RemoteStore,
};
pub use dir::DirRemote;
pub use memory::MemoryRemote;
