// Channel configuration shared by both ends of a peer link.
//
// Nothing here is negotiated on the wire: both peers must be built with the
// same `PeerConfig` or the first transport message fails to authenticate.

use serde::{Deserialize, Serialize};

use crate::crypto::aead::CipherSuite;
use crate::crypto::x25519::KeyDerivation;
use crate::error::Result;

/// Cipher and key schedule selection for one channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeerConfig {
    /// AEAD used for transport messages.
    pub cipher_suite: CipherSuite,
    /// How the transport key is obtained from the X25519 shared secret.
    pub key_derivation: KeyDerivation,
}

impl PeerConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to compact JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_cipher_suite(mut self, suite: CipherSuite) -> Self {
        self.cipher_suite = suite;
        self
    }

    pub fn with_key_derivation(mut self, kdf: KeyDerivation) -> Self {
        self.key_derivation = kdf;
        self
    }
}
