// Integration tests for the pending/established handle and its completion signal.

mod common;

use std::sync::Arc;
use std::thread;

use common::{sides, Loopback, Side};
use strandpeer::handshake::messages::encode_signed_public_key;
use strandpeer::{
    HandshakeOutcome, HandshakeWaiter, PeerConfig, PeerError, PeerHandle, PeerStatus, Role,
    SharedPeer,
};

type Handle = PeerHandle<Arc<Loopback>>;

fn initiate(side: &Side, role: Role) -> (Handle, HandshakeWaiter) {
    PeerHandle::initiate(&side.id, side.wire.clone(), &(), role, PeerConfig::default()).unwrap()
}

fn connected() -> (Side, Side, Handle, Handle) {
    let (a, b) = sides();
    let (mut initiator, _) = initiate(&a, Role::ActiveInitiator);
    let (mut responder, _) = initiate(&b, Role::PassiveResponder);
    responder
        .continue_key_exchange(&b.id, &(), &a.wire.take_one())
        .unwrap();
    initiator
        .continue_key_exchange(&a.id, &(), &b.wire.take_one())
        .unwrap();
    (a, b, initiator, responder)
}

// ── Completion signal ────────────────────────────────────────────────────

#[test]
fn pending_until_done_then_signalled() {
    let (a, b) = sides();
    let (mut initiator, mut init_waiter) = initiate(&a, Role::ActiveInitiator);
    let (mut responder, mut resp_waiter) = initiate(&b, Role::PassiveResponder);

    assert_eq!(initiator.status(), PeerStatus::Pending);
    assert!(initiator.established().is_none());
    assert_eq!(init_waiter.try_outcome(), None);

    responder
        .continue_key_exchange(&b.id, &(), &a.wire.take_one())
        .unwrap();
    assert_eq!(responder.status(), PeerStatus::Established);
    assert_eq!(resp_waiter.try_outcome(), Some(HandshakeOutcome::Established));
    assert_eq!(init_waiter.try_outcome(), None);

    initiator
        .continue_key_exchange(&a.id, &(), &b.wire.take_one())
        .unwrap();
    assert_eq!(init_waiter.try_outcome(), Some(HandshakeOutcome::Established));
    // Resolved outcome is sticky on the waiter.
    assert_eq!(init_waiter.try_outcome(), Some(HandshakeOutcome::Established));

    let peer = initiator.established().unwrap();
    assert_eq!(peer.session_fingerprint(), responder.peer().session_fingerprint());
}

#[test]
fn signature_failure_does_not_signal() {
    let (a, b) = sides();
    let (_initiator, _) = initiate(&a, Role::ActiveInitiator);
    let (mut responder, mut waiter) = initiate(&b, Role::PassiveResponder);
    let mut forged = a.wire.take_one().to_vec();
    forged[70] ^= 1;

    let err = responder.continue_key_exchange(&b.id, &(), &forged).unwrap_err();
    assert!(matches!(err, PeerError::SignatureVerification));
    assert_eq!(responder.status(), PeerStatus::Pending);
    assert_eq!(waiter.try_outcome(), None);
}

#[test]
fn failure_signalled_once() {
    let (a, b) = sides();
    let (mut responder, mut waiter) = initiate(&b, Role::PassiveResponder);
    let bad = encode_signed_public_key(&a.id, &[0u8; 32]).unwrap();

    assert!(responder.continue_key_exchange(&b.id, &(), &bad).is_err());
    assert_eq!(responder.status(), PeerStatus::Failed);
    assert_eq!(waiter.try_outcome(), Some(HandshakeOutcome::Failed));

    let err = responder.continue_key_exchange(&b.id, &(), &bad).unwrap_err();
    assert!(matches!(err, PeerError::PreviouslyFailed));
    assert_eq!(waiter.try_outcome(), Some(HandshakeOutcome::Failed));

    let handle = responder.into_established().unwrap_err();
    assert_eq!(handle.status(), PeerStatus::Failed);
}

#[test]
fn dropped_handle_is_abandoned() {
    let (a, _b) = sides();
    let (initiator, mut waiter) = initiate(&a, Role::ActiveInitiator);
    drop(initiator);
    assert_eq!(waiter.try_outcome(), Some(HandshakeOutcome::Abandoned));
}

#[tokio::test]
async fn waiter_resolves_asynchronously() {
    let (a, b) = sides();
    let (mut initiator, init_waiter) = initiate(&a, Role::ActiveInitiator);
    let (mut responder, resp_waiter) = initiate(&b, Role::PassiveResponder);

    let waiting = tokio::spawn(init_waiter.wait());

    responder
        .continue_key_exchange(&b.id, &(), &a.wire.take_one())
        .unwrap();
    initiator
        .continue_key_exchange(&a.id, &(), &b.wire.take_one())
        .unwrap();

    assert_eq!(waiting.await.unwrap(), HandshakeOutcome::Established);
    assert_eq!(resp_waiter.wait().await, HandshakeOutcome::Established);
}

// ── Established handle ───────────────────────────────────────────────────

#[test]
fn handle_carries_traffic_and_unwraps() {
    let (a, b, mut initiator, mut responder) = connected();

    assert_eq!(initiator.remote_endpoint(), &b.id.public_key_bytes()[..]);
    initiator.send_message(&(), b"ping").unwrap();
    assert_eq!(responder.unwrap_message(&a.wire.take_one()).unwrap(), b"ping");

    let mut peer = responder.into_established().unwrap();
    peer.send_message(&(), b"pong").unwrap();
    let reply = b.wire.take_one();
    let inner = initiator.established_mut().unwrap();
    assert_eq!(inner.unwrap_message(&reply).unwrap(), b"pong");
}

#[test]
fn shared_peer_serialises_concurrent_senders() {
    let (a, _b, initiator, responder) = connected();
    let shared = SharedPeer::new(initiator);

    let workers: Vec<_> = (0..4)
        .map(|t| {
            let shared = shared.clone();
            thread::spawn(move || {
                for i in 0..25 {
                    shared
                        .send_message(&(), format!("{t}:{i}").as_bytes())
                        .unwrap();
                }
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    // Frames hit the transport in seal order, so every one opens in sequence.
    let receiver = SharedPeer::from(responder);
    let frames = a.wire.take_sent();
    assert_eq!(frames.len(), 100);
    for frame in &frames {
        receiver.unwrap_message(frame).unwrap();
    }

    assert_eq!(shared.status(), PeerStatus::Established);
    let counters = shared.with(|h| h.peer().counters());
    assert_eq!(counters, Some((100, 0)));
    let handle = shared.try_unwrap().ok().unwrap();
    assert_eq!(handle.status(), PeerStatus::Established);
}
