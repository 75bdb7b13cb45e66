//! Cryptographic primitives for Tidepool.
//!
//! This crate provides:
//! - Authenticated encryption using XChaCha20-Poly1305
//! - A credential vault modelling the platform secure-storage facility
//! - Secure key handling with automatic zeroization
//!
//! # Security Guarantees
//! - Key material is automatically zeroized on drop
//! - No plaintext or key material is ever logged

pub mod aead;
pub mod credentials;
pub mod key;

pub use aead::{decrypt, encrypt};
pub use credentials::{AeadCredentialVault, CredentialVault};
pub use key::{DeviceKey, KEY_LENGTH};
