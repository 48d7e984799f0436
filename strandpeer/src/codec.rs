// Authenticated transport codec.
//
// One AEAD key seals both directions, and each direction has its own counter
// starting at zero. The nonce is never sent: the receiver rebuilds it from its
// own counter, so frames must be opened in exactly the order they were sealed,
// with nothing lost or repeated.
//
// Known weakness: the counters do not separate the directions. Message k from
// the initiator and message k from the responder are sealed under the same
// (key, nonce) pair. Like the raw key schedule (no KDF by default), this is
// kept for wire compatibility; `KeyDerivation::HkdfSha256` does not change it.
//
// Nonce layout (12 bytes):
//
//   [ counter, u64 little-endian | 0x00 0x00 0x00 0x00 ]
//     bytes 0..8                   bytes 8..12

use tracing::{trace, warn};

use crate::config::PeerConfig;
use crate::crypto::aead::{AeadKey, CipherSuite, NONCE_LEN};
use crate::crypto::hash::{session_fingerprint, FINGERPRINT_LEN};
use crate::crypto::x25519::SharedKey;
use crate::error::{PeerError, Result};

/// Build the nonce for a counter value.
pub fn nonce_for(counter: u64) -> [u8; NONCE_LEN] {
    let mut nonce = [0u8; NONCE_LEN];
    nonce[..8].copy_from_slice(&counter.to_le_bytes());
    nonce
}

/// Return the current counter value and advance it by one.
fn advance(counter: &mut u64) -> Result<u64> {
    let current = *counter;
    *counter = current.checked_add(1).ok_or(PeerError::NonceExhausted)?;
    Ok(current)
}

/// Symmetric state of an established channel.
pub struct TransportCipher {
    aead: AeadKey,
    send_counter: u64,
    recv_counter: u64,
    fingerprint: [u8; FINGERPRINT_LEN],
}

impl TransportCipher {
    /// Key the channel cipher from the DH shared secret.
    pub fn new(config: &PeerConfig, shared: &SharedKey) -> Result<Self> {
        let key = shared.transport_key(config.key_derivation)?;
        let aead = AeadKey::new(config.cipher_suite, key.as_bytes())?;
        Ok(Self {
            aead,
            send_counter: 0,
            recv_counter: 0,
            fingerprint: session_fingerprint(key.as_bytes()),
        })
    }

    /// Seal `plaintext` under the next send nonce.
    ///
    /// The send counter advances before sealing, so the nonce is spent even
    /// if this call or the subsequent transport send fails.
    pub fn seal(&mut self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let counter = advance(&mut self.send_counter)?;
        trace!(counter, len = plaintext.len(), "sealing transport message");
        self.aead.encrypt(&nonce_for(counter), plaintext, b"")
    }

    /// Open `ciphertext` under the next receive nonce.
    ///
    /// The receive counter advances whether or not authentication succeeds.
    pub fn open(&mut self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        let counter = advance(&mut self.recv_counter)?;
        trace!(counter, len = ciphertext.len(), "opening transport message");
        self.aead
            .decrypt(&nonce_for(counter), ciphertext, b"")
            .map_err(|e| {
                warn!(counter, "transport message failed authentication");
                e
            })
    }

    /// Next counter value `seal` will use.
    pub fn send_counter(&self) -> u64 {
        self.send_counter
    }

    /// Next counter value `open` will use.
    pub fn recv_counter(&self) -> u64 {
        self.recv_counter
    }

    pub fn suite(&self) -> CipherSuite {
        self.aead.suite()
    }

    /// Short hash of the transport key, equal on both ends.
    pub fn fingerprint(&self) -> [u8; FINGERPRINT_LEN] {
        self.fingerprint
    }

    #[cfg(test)]
    pub(crate) fn set_counters(&mut self, send: u64, recv: u64) {
        self.send_counter = send;
        self.recv_counter = recv;
    }
}

impl std::fmt::Debug for TransportCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportCipher")
            .field("suite", &self.suite())
            .field("send_counter", &self.send_counter)
            .field("recv_counter", &self.recv_counter)
            .finish_non_exhaustive()
    }
}
