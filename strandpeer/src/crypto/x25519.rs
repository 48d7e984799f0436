// X25519 Diffie-Hellman key exchange for transport key derivation.
//
// X25519 is the single, fixed DH group for every channel. The ephemeral secret
// is an `EphemeralSecret`, which `diffie_hellman` consumes: once a shared
// secret exists, the private scalar that produced it is gone.

use hkdf::Hkdf;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use x25519_dalek::{EphemeralSecret, PublicKey};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{PeerError, Result};

/// Length of an X25519 public key on the wire.
pub const PUBLIC_KEY_LEN: usize = 32;

/// HKDF info label for the optional key schedule.
const HKDF_INFO: &[u8] = b"strandpeer transport key v1";

/// How the transport key is obtained from the DH shared secret.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyDerivation {
    /// The 32 raw shared-secret bytes are the AEAD key.
    #[default]
    #[serde(rename = "raw")]
    Raw,
    /// HKDF-SHA256, no salt, fixed info label.
    #[serde(rename = "hkdf_sha256")]
    HkdfSha256,
}

/// An X25519 ephemeral keypair for one handshake.
pub struct EphemeralKeyPair {
    secret: EphemeralSecret,
    public: PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a new random ephemeral keypair.
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// The 32-byte public key.
    pub fn public_key_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        *self.public.as_bytes()
    }

    /// Perform Diffie-Hellman with the peer's encoded public key, consuming
    /// the ephemeral secret.
    ///
    /// Fails on a public key of the wrong length and on low-order points that
    /// produce a non-contributory (all-zero) shared secret.
    pub fn diffie_hellman(self, peer_public: &[u8]) -> Result<SharedKey> {
        let peer_bytes: [u8; PUBLIC_KEY_LEN] = peer_public.try_into().map_err(|_| {
            PeerError::KeyAgreement(format!(
                "peer public key is {} bytes, expected {PUBLIC_KEY_LEN}",
                peer_public.len()
            ))
        })?;
        let shared = self.secret.diffie_hellman(&PublicKey::from(peer_bytes));
        if !shared.was_contributory() {
            return Err(PeerError::KeyAgreement(
                "non-contributory shared secret".into(),
            ));
        }
        Ok(SharedKey {
            bytes: shared.to_bytes(),
        })
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &self.public)
            .finish_non_exhaustive()
    }
}

/// Raw 32-byte DH output. Zeroed when dropped.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedKey {
    bytes: [u8; 32],
}

impl SharedKey {
    /// The raw shared secret bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Produce the AEAD key according to `kdf`.
    pub fn transport_key(&self, kdf: KeyDerivation) -> Result<SharedKey> {
        match kdf {
            KeyDerivation::Raw => Ok(SharedKey { bytes: self.bytes }),
            KeyDerivation::HkdfSha256 => {
                let hk = Hkdf::<Sha256>::new(None, &self.bytes);
                let mut okm = [0u8; 32];
                hk.expand(HKDF_INFO, &mut okm)
                    .map_err(|e| PeerError::CipherInit(format!("HKDF expand error: {e}")))?;
                Ok(SharedKey { bytes: okm })
            }
        }
    }
}

impl std::fmt::Debug for SharedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SharedKey(..)")
    }
}
