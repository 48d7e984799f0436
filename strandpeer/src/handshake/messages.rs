// Handshake wire message: signature || raw X25519 public key.
//
// Exactly two are exchanged per channel: the initiator's, then the
// responder's. The signature length is fixed by the identity scheme and is
// not encoded.

use crate::capability::Identity;
use crate::error::{PeerError, Result};

/// A handshake message split into its two parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignedPublicKey<'a> {
    pub signature: &'a [u8],
    pub public_key: &'a [u8],
}

impl<'a> SignedPublicKey<'a> {
    /// Split `raw` after a `signature_size`-byte prefix.
    pub fn split(raw: &'a [u8], signature_size: usize) -> Result<Self> {
        if raw.len() < signature_size {
            return Err(PeerError::MessageTooShort {
                need: signature_size,
                have: raw.len(),
            });
        }
        let (signature, public_key) = raw.split_at(signature_size);
        Ok(Self {
            signature,
            public_key,
        })
    }

    /// Check the signature against the remote peer's identity.
    pub fn verify<I: Identity + ?Sized>(&self, identity: &I, remote_endpoint: &[u8]) -> Result<()> {
        if identity.verify(remote_endpoint, self.public_key, self.signature) {
            Ok(())
        } else {
            Err(PeerError::SignatureVerification)
        }
    }
}

/// Sign `public_key` with the local identity and build the wire message.
pub fn encode_signed_public_key<I: Identity + ?Sized>(identity: &I, public_key: &[u8]) -> Result<Vec<u8>> {
    let expected = identity.signature_size();
    let signature = identity.sign(public_key);
    if signature.len() != expected {
        return Err(PeerError::SignatureLength {
            expected,
            actual: signature.len(),
        });
    }
    let mut out = Vec::with_capacity(expected + public_key.len());
    out.extend_from_slice(&signature);
    out.extend_from_slice(public_key);
    Ok(out)
}
