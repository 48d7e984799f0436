// StrandPeer: signed ephemeral key exchange and sequenced AEAD channel
//
// Crate root: module declarations and public re-exports.
//
//   Initiator                              Responder
//     |--- sig(I) || x25519_pub(I) --------->|   verify, DH, reply
//     |<-- sig(R) || x25519_pub(R) ----------|
//     |  verify, DH                          |
//     |==== AEAD, nonce = per-direction counter ====|

pub mod capability;
pub mod codec;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handshake;
pub mod lifecycle;
pub mod peer;

// Re-export key types at crate root for convenience.
pub use capability::{Identity, Transport};
pub use config::PeerConfig;
pub use crypto::keys::Ed25519Identity;
pub use error::{PeerError, Result};
pub use handshake::state::{Phase, Role};
pub use lifecycle::{HandshakeOutcome, HandshakeWaiter, PeerHandle, PeerStatus, SharedPeer};
pub use peer::EstablishedPeer;
