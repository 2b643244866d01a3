//! Credential creation for legacy-tier ceremonies
//!
//! A [`Credential`] binds one legacy ceremony to fresh key material. The dialog seals
//! a payload with it once the user is verified, which attests that the ceremony
//! actually took place. Key material is zeroized when the credential is dropped at
//! the end of the attempt.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::error::{FpAuthError, Result};

/// Size of the nonce for ChaCha20-Poly1305
const NONCE_SIZE: usize = 12;

/// Produces credentials for legacy-tier attempts
///
/// Any error is reported to callers as NOT_AVAILABLE; there is no separate code for
/// missing credential material.
pub trait CredentialProvider: Send + Sync {
    fn create_credential(&self) -> Result<Credential>;
}

/// Opaque cryptographic binding object owned by one ceremony
pub struct Credential {
    alias: String,
    key: [u8; 32],
}

impl Credential {
    /// Wrap existing key material
    pub fn new(alias: impl Into<String>, key: [u8; 32]) -> Self {
        Self {
            alias: alias.into(),
            key,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Short public identifier for logs (never the key itself)
    pub fn key_id(&self) -> String {
        let digest = Sha256::digest(self.key);
        hex::encode(&digest[..8])
    }

    /// Seal a payload, returning nonce || ciphertext
    pub fn seal(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|e| FpAuthError::Credential(format!("Nonce generation failed: {}", e)))?;

        let cipher = ChaCha20Poly1305::new_from_slice(&self.key)
            .map_err(|e| FpAuthError::Credential(format!("Invalid key: {}", e)))?;

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), payload)
            .map_err(|e| FpAuthError::Credential(format!("Sealing failed: {}", e)))?;

        let mut sealed = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("alias", &self.alias)
            .field("key_id", &self.key_id())
            .finish()
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.key.zeroize();
    }
}

/// Software keystore generating a fresh key per ceremony under a fixed alias
#[derive(Debug, Clone)]
pub struct SoftwareKeystore {
    alias: String,
}

impl SoftwareKeystore {
    pub fn new(alias: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }
}

impl CredentialProvider for SoftwareKeystore {
    fn create_credential(&self) -> Result<Credential> {
        let mut key = [0u8; 32];
        rand::rngs::OsRng
            .try_fill_bytes(&mut key)
            .map_err(|e| FpAuthError::Credential(format!("Key generation failed: {}", e)))?;

        let credential = Credential::new(self.alias.clone(), key);
        key.zeroize();
        Ok(credential)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keystore_creates_distinct_credentials() {
        let keystore = SoftwareKeystore::new("test_key");
        let first = keystore.create_credential().unwrap();
        let second = keystore.create_credential().unwrap();

        assert_eq!(first.alias(), "test_key");
        assert_ne!(first.key_id(), second.key_id());
    }

    #[test]
    fn test_seal_prefixes_fresh_nonce() {
        let credential = Credential::new("k", [7u8; 32]);
        let first = credential.seal(b"ceremony").unwrap();
        let second = credential.seal(b"ceremony").unwrap();

        // nonce + payload + 16-byte tag
        assert_eq!(first.len(), NONCE_SIZE + b"ceremony".len() + 16);
        assert_ne!(first[..NONCE_SIZE], second[..NONCE_SIZE]);
        assert_ne!(first, second);
    }

    #[test]
    fn test_debug_does_not_leak_key() {
        let credential = Credential::new("k", [0xAB; 32]);
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("key: "));
        assert!(rendered.contains("key_id"));
    }
}
