//! Credential protection for the sync configuration document.
//!
//! The sync engine never persists the remote password in the clear. It goes
//! through a [`CredentialVault`], which models the platform secure-storage
//! facility: encrypt on save, decrypt once at engine startup. On platforms
//! without secure storage the vault reports itself unavailable and sync
//! initialization refuses to run with an undecryptable credential.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use tidepool_common::{Error, Result};

use crate::aead;
use crate::key::DeviceKey;

/// Capability for protecting credentials at rest.
pub trait CredentialVault: Send + Sync {
    /// Whether the facility can encrypt/decrypt on this platform.
    fn is_available(&self) -> bool;

    /// Encrypt a credential, returning a base64 string safe to embed in a
    /// JSON document.
    fn encrypt_string(&self, plaintext: &str) -> Result<String>;

    /// Decrypt a credential previously produced by [`encrypt_string`].
    ///
    /// # Errors
    /// - Returns a Crypto error on tampered or foreign ciphertext
    ///
    /// [`encrypt_string`]: CredentialVault::encrypt_string
    fn decrypt_string(&self, ciphertext: &str) -> Result<String>;
}

/// [`CredentialVault`] backed by XChaCha20-Poly1305 with a device key.
pub struct AeadCredentialVault {
    key: DeviceKey,
}

impl AeadCredentialVault {
    /// Create a vault around an existing device key.
    pub fn new(key: DeviceKey) -> Self {
        Self { key }
    }
}

impl CredentialVault for AeadCredentialVault {
    fn is_available(&self) -> bool {
        true
    }

    fn encrypt_string(&self, plaintext: &str) -> Result<String> {
        let ciphertext = aead::encrypt(self.key.as_bytes(), plaintext.as_bytes())?;
        Ok(BASE64.encode(ciphertext))
    }

    fn decrypt_string(&self, ciphertext: &str) -> Result<String> {
        let raw = BASE64
            .decode(ciphertext)
            .map_err(|e| Error::Crypto(format!("Invalid credential encoding: {}", e)))?;
        let plaintext = aead::decrypt(self.key.as_bytes(), &raw)?;
        String::from_utf8(plaintext)
            .map_err(|e| Error::Crypto(format!("Decrypted credential is not UTF-8: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let vault = AeadCredentialVault::new(DeviceKey::generate());
        assert!(vault.is_available());

        let encrypted = vault.encrypt_string("hunter2").unwrap();
        assert_ne!(encrypted, "hunter2");

        let decrypted = vault.decrypt_string(&encrypted).unwrap();
        assert_eq!(decrypted, "hunter2");
    }

    #[test]
    fn test_foreign_key_fails() {
        let vault_a = AeadCredentialVault::new(DeviceKey::generate());
        let vault_b = AeadCredentialVault::new(DeviceKey::generate());

        let encrypted = vault_a.encrypt_string("hunter2").unwrap();
        assert!(vault_b.decrypt_string(&encrypted).is_err());
    }

    #[test]
    fn test_garbage_input_fails() {
        let vault = AeadCredentialVault::new(DeviceKey::generate());
        assert!(vault.decrypt_string("not base64 at all!!!").is_err());
        assert!(vault.decrypt_string("aGVsbG8=").is_err());
    }
}
