// Ed25519 identity: the reference `Identity` capability.
//
// The remote endpoint token understood by `verify` is the remote peer's raw
// 32-byte Ed25519 verifying key.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use crate::capability::Identity;

/// Length of an Ed25519 signature.
pub const SIGNATURE_LEN: usize = 64;

/// An Ed25519 long-term identity keypair.
#[derive(Debug)]
pub struct Ed25519Identity {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519Identity {
    /// Generate a fresh random Ed25519 keypair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::generate(&mut OsRng))
    }

    /// Reconstruct from a 32-byte secret seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// The 32-byte Ed25519 public key; peers use it as this node's endpoint token.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// The 32-byte secret key seed.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }
}

impl Identity for Ed25519Identity {
    fn signature_size(&self) -> usize {
        SIGNATURE_LEN
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        let sig: Signature = self.signing_key.sign(data);
        sig.to_bytes().to_vec()
    }

    fn verify(&self, remote_endpoint: &[u8], data: &[u8], signature: &[u8]) -> bool {
        let Ok(pubkey) = <[u8; 32]>::try_from(remote_endpoint) else {
            return false;
        };
        let Ok(vk) = VerifyingKey::from_bytes(&pubkey) else {
            return false;
        };
        let Ok(sig) = Signature::from_slice(signature) else {
            return false;
        };
        vk.verify(data, &sig).is_ok()
    }
}
