// Shared fixtures for the integration tests: an in-memory transport and a
// pair of identities wired to each other.

#![allow(dead_code)]

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use strandpeer::{Ed25519Identity, EstablishedPeer, PeerConfig, Role, Transport};

/// In-memory transport that records every frame it is asked to send.
#[derive(Debug)]
pub struct Loopback {
    remote: [u8; 32],
    sent: Mutex<Vec<Bytes>>,
    failing: AtomicBool,
}

impl Loopback {
    pub fn new(remote: [u8; 32]) -> Arc<Self> {
        Arc::new(Self {
            remote,
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        })
    }

    pub fn take_sent(&self) -> Vec<Bytes> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Pop the single frame sent since the last call.
    pub fn take_one(&self) -> Bytes {
        let mut sent = self.take_sent();
        assert_eq!(sent.len(), 1, "expected exactly one frame");
        sent.remove(0)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Transport for Loopback {
    type Context = ();
    type Error = io::Error;

    fn send(&self, _ctx: &(), payload: Bytes) -> Result<(), io::Error> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "link down"));
        }
        self.sent.lock().push(payload);
        Ok(())
    }

    fn remote_endpoint(&self) -> &[u8] {
        &self.remote
    }
}

pub type Peer = EstablishedPeer<Arc<Loopback>>;

/// One end of a test link.
pub struct Side {
    pub id: Ed25519Identity,
    pub wire: Arc<Loopback>,
}

/// Two identities, each with a transport pointing at the other.
pub fn sides() -> (Side, Side) {
    let alice = Ed25519Identity::generate();
    let bob = Ed25519Identity::generate();
    let alice_wire = Loopback::new(bob.public_key_bytes());
    let bob_wire = Loopback::new(alice.public_key_bytes());
    (
        Side {
            id: alice,
            wire: alice_wire,
        },
        Side {
            id: bob,
            wire: bob_wire,
        },
    )
}

/// Create both peers; the initiator's hello is left in `a.wire`.
pub fn start(a: &Side, b: &Side, config: PeerConfig) -> (Peer, Peer) {
    let initiator = EstablishedPeer::establish_with_config(
        &a.id,
        a.wire.clone(),
        &(),
        Role::ActiveInitiator,
        config,
    )
    .unwrap();
    let responder = EstablishedPeer::establish_with_config(
        &b.id,
        b.wire.clone(),
        &(),
        Role::PassiveResponder,
        config,
    )
    .unwrap();
    (initiator, responder)
}

/// Run the full two-message exchange.
pub fn connect(a: &Side, b: &Side, config: PeerConfig) -> (Peer, Peer) {
    let (mut initiator, mut responder) = start(a, b, config);
    responder
        .continue_key_exchange(&b.id, &(), &a.wire.take_one())
        .unwrap();
    initiator
        .continue_key_exchange(&a.id, &(), &b.wire.take_one())
        .unwrap();
    (initiator, responder)
}
