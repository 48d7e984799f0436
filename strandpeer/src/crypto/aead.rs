// AEAD cipher suites: AES-256-GCM (default) and ChaCha20-Poly1305 (RFC 8439).
//
// Both take a 32-byte key and a 12-byte nonce and append a 16-byte tag.

// Both aes-gcm and chacha20poly1305 re-export the same `aead` traits.
// Import once from aes_gcm to avoid redundant imports.
use aes_gcm::aead::{Aead, KeyInit, Payload};
use aes_gcm::{Aes256Gcm, Nonce as AesNonce};
use chacha20poly1305::{ChaCha20Poly1305, Nonce};
use serde::{Deserialize, Serialize};

use crate::error::{PeerError, Result};

/// Length of every AEAD nonce.
pub const NONCE_LEN: usize = 12;

/// Length of the authentication tag appended to each ciphertext.
pub const TAG_LEN: usize = 16;

/// Cipher suite selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CipherSuite {
    /// AES-256-GCM.
    #[default]
    #[serde(rename = "aes256_gcm")]
    Aes256Gcm,
    /// ChaCha20-Poly1305.
    #[serde(rename = "chacha20_poly1305")]
    ChaCha20Poly1305,
}

impl CipherSuite {
    pub fn name(self) -> &'static str {
        match self {
            CipherSuite::Aes256Gcm => "aes256_gcm",
            CipherSuite::ChaCha20Poly1305 => "chacha20_poly1305",
        }
    }
}

/// A keyed AEAD instance for one of the supported suites.
///
/// No associated data is used by the channel; `aad` is exposed for tests
/// and callers layering their own framing.
pub enum AeadKey {
    Aes256Gcm(Box<Aes256Gcm>),
    ChaCha20Poly1305(Box<ChaCha20Poly1305>),
}

impl AeadKey {
    /// Key the selected suite with `key`.
    pub fn new(suite: CipherSuite, key: &[u8]) -> Result<Self> {
        match suite {
            CipherSuite::Aes256Gcm => Aes256Gcm::new_from_slice(key)
                .map(|c| AeadKey::Aes256Gcm(Box::new(c)))
                .map_err(|e| PeerError::CipherInit(format!("aes-gcm init: {e}"))),
            CipherSuite::ChaCha20Poly1305 => ChaCha20Poly1305::new_from_slice(key)
                .map(|c| AeadKey::ChaCha20Poly1305(Box::new(c)))
                .map_err(|e| PeerError::CipherInit(format!("cipher init: {e}"))),
        }
    }

    pub fn suite(&self) -> CipherSuite {
        match self {
            AeadKey::Aes256Gcm(_) => CipherSuite::Aes256Gcm,
            AeadKey::ChaCha20Poly1305(_) => CipherSuite::ChaCha20Poly1305,
        }
    }

    /// Encrypt `plaintext`, returning ciphertext || tag.
    pub fn encrypt(&self, nonce: &[u8; NONCE_LEN], plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let payload = Payload { msg: plaintext, aad };
        let sealed = match self {
            AeadKey::Aes256Gcm(c) => c.encrypt(AesNonce::from_slice(nonce), payload),
            AeadKey::ChaCha20Poly1305(c) => c.encrypt(Nonce::from_slice(nonce), payload),
        };
        sealed.map_err(|e| PeerError::Encryption(format!("{e}")))
    }

    /// Decrypt `ciphertext` (which includes the appended tag).
    pub fn decrypt(&self, nonce: &[u8; NONCE_LEN], ciphertext: &[u8], aad: &[u8]) -> Result<Vec<u8>> {
        let payload = Payload {
            msg: ciphertext,
            aad,
        };
        let opened = match self {
            AeadKey::Aes256Gcm(c) => c.decrypt(AesNonce::from_slice(nonce), payload),
            AeadKey::ChaCha20Poly1305(c) => c.decrypt(Nonce::from_slice(nonce), payload),
        };
        opened.map_err(|e| PeerError::Decryption(format!("{e}")))
    }
}
