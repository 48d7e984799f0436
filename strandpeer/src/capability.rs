// Capabilities the channel consumes but does not implement.
//
// The identity subsystem signs and verifies; the transport moves opaque
// frames and names the remote end. Both are plain traits so orchestration
// code can plug in whatever key store and socket layer it already has.

use std::sync::Arc;

use bytes::Bytes;

/// Long-term signing identity used to authenticate ephemeral public keys.
pub trait Identity {
    /// Length of every signature produced by [`Identity::sign`].
    fn signature_size(&self) -> usize;

    /// Sign `data` with the local long-term key.
    fn sign(&self, data: &[u8]) -> Vec<u8>;

    /// Check `signature` over `data` against the identity named by `remote_endpoint`.
    fn verify(&self, remote_endpoint: &[u8], data: &[u8], signature: &[u8]) -> bool;
}

/// Message transport to exactly one remote peer.
///
/// Frames handed to [`Transport::send`] must reach the remote in order and
/// without loss: transport nonces are implicit per-direction counters.
pub trait Transport {
    /// Opaque value threaded through every send.
    type Context: ?Sized;
    /// Error reported when a send fails.
    type Error: std::error::Error + Send + Sync + 'static;

    fn send(&self, ctx: &Self::Context, payload: Bytes) -> Result<(), Self::Error>;

    /// Stable token naming the remote peer; also its verification identity.
    fn remote_endpoint(&self) -> &[u8];
}

impl<T: Identity + ?Sized> Identity for &T {
    fn signature_size(&self) -> usize {
        (**self).signature_size()
    }

    fn sign(&self, data: &[u8]) -> Vec<u8> {
        (**self).sign(data)
    }

    fn verify(&self, remote_endpoint: &[u8], data: &[u8], signature: &[u8]) -> bool {
        (**self).verify(remote_endpoint, data, signature)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    type Context = T::Context;
    type Error = T::Error;

    fn send(&self, ctx: &Self::Context, payload: Bytes) -> Result<(), Self::Error> {
        (**self).send(ctx, payload)
    }

    fn remote_endpoint(&self) -> &[u8] {
        (**self).remote_endpoint()
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    type Context = T::Context;
    type Error = T::Error;

    fn send(&self, ctx: &Self::Context, payload: Bytes) -> Result<(), Self::Error> {
        (**self).send(ctx, payload)
    }

    fn remote_endpoint(&self) -> &[u8] {
        (**self).remote_endpoint()
    }
}
