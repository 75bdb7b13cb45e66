//! Device key with secure memory handling.
//!
//! The key is handed to Tidepool by the embedding platform (keychain,
//! keyring, TPM) and zeroizes its memory on drop.

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Length of the device key in bytes (256-bit).
pub const KEY_LENGTH: usize = 32;

/// Symmetric key protecting credentials at rest.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DeviceKey {
    key: [u8; KEY_LENGTH],
}

impl DeviceKey {
    /// Create a device key from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LENGTH]) -> Self {
        Self { key }
    }

    /// Generate a random device key.
    pub fn generate() -> Self {
        use rand::RngCore;
        let mut key = [0u8; KEY_LENGTH];
        rand::thread_rng().fill_bytes(&mut key);
        Self { key }
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.key
    }
}

impl fmt::Debug for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceKey([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_random() {
        let a = DeviceKey::generate();
        let b = DeviceKey::generate();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn test_debug_is_redacted() {
        let key = DeviceKey::from_bytes([7u8; KEY_LENGTH]);
        assert_eq!(format!("{:?}", key), "DeviceKey([REDACTED])");
    }
}
