// Caller-facing peer handle.
//
// Orchestration holds a `PeerHandle` from the moment a handshake starts. The
// handle is `Pending` until the key exchange reaches `Done` or `Failed`; at
// that transition the paired `HandshakeWaiter` is signalled exactly once.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::oneshot;
use tracing::debug;

use crate::capability::{Identity, Transport};
use crate::config::PeerConfig;
use crate::error::Result;
use crate::handshake::state::{Phase, Role};
use crate::peer::EstablishedPeer;

/// Terminal result of a handshake, delivered through the completion signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeOutcome {
    Established,
    Failed,
    /// The handle was dropped before the handshake finished.
    Abandoned,
}

/// Coarse lifecycle of a [`PeerHandle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerStatus {
    Pending,
    Established,
    Failed,
}

/// Receiving side of the completion signal.
#[derive(Debug)]
pub struct HandshakeWaiter {
    rx: oneshot::Receiver<HandshakeOutcome>,
    resolved: Option<HandshakeOutcome>,
}

impl HandshakeWaiter {
    /// Wait for the handshake to reach a terminal phase.
    pub async fn wait(self) -> HandshakeOutcome {
        if let Some(outcome) = self.resolved {
            return outcome;
        }
        self.rx.await.unwrap_or(HandshakeOutcome::Abandoned)
    }

    /// Non-blocking check. `None` while the handshake is still in progress.
    pub fn try_outcome(&mut self) -> Option<HandshakeOutcome> {
        if self.resolved.is_none() {
            self.resolved = match self.rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => Some(HandshakeOutcome::Abandoned),
            };
        }
        self.resolved
    }
}

/// Handle to a channel whose handshake may still be in progress.
#[derive(Debug)]
pub struct PeerHandle<T: Transport> {
    peer: EstablishedPeer<T>,
    done: Option<oneshot::Sender<HandshakeOutcome>>,
}

impl<T: Transport> PeerHandle<T> {
    /// Start a handshake and return the pending handle with its waiter.
    pub fn initiate<I: Identity + ?Sized>(
        identity: &I,
        transport: T,
        ctx: &T::Context,
        role: Role,
        config: PeerConfig,
    ) -> Result<(Self, HandshakeWaiter)> {
        let peer = EstablishedPeer::establish_with_config(identity, transport, ctx, role, config)?;
        let (tx, rx) = oneshot::channel();
        let handle = Self {
            peer,
            done: Some(tx),
        };
        let waiter = HandshakeWaiter { rx, resolved: None };
        Ok((handle, waiter))
    }

    pub fn status(&self) -> PeerStatus {
        match self.peer.phase() {
            Phase::Done => PeerStatus::Established,
            Phase::Failed => PeerStatus::Failed,
            Phase::ActivelyWaitForPublicKey | Phase::PassivelyWaitForPublicKey => {
                PeerStatus::Pending
            }
        }
    }

    /// Deliver a handshake message; signals the waiter on a terminal transition.
    pub fn continue_key_exchange<I: Identity + ?Sized>(
        &mut self,
        identity: &I,
        ctx: &T::Context,
        raw: &[u8],
    ) -> Result<()> {
        let result = self.peer.continue_key_exchange(identity, ctx, raw);
        self.signal_if_terminal();
        result
    }

    fn signal_if_terminal(&mut self) {
        let outcome = match self.status() {
            PeerStatus::Pending => return,
            PeerStatus::Established => HandshakeOutcome::Established,
            PeerStatus::Failed => HandshakeOutcome::Failed,
        };
        if let Some(tx) = self.done.take() {
            debug!(?outcome, "handshake resolved");
            // The waiter may already be gone; nobody left to tell.
            let _ = tx.send(outcome);
        }
    }

    /// The live channel, once the handshake is `Done`.
    pub fn established(&self) -> Option<&EstablishedPeer<T>> {
        self.peer.is_established().then_some(&self.peer)
    }

    pub fn established_mut(&mut self) -> Option<&mut EstablishedPeer<T>> {
        if self.peer.is_established() {
            Some(&mut self.peer)
        } else {
            None
        }
    }

    /// Unwrap the channel once `Done`; otherwise hand the handle back.
    pub fn into_established(self) -> std::result::Result<EstablishedPeer<T>, Self> {
        if self.peer.is_established() {
            Ok(self.peer)
        } else {
            Err(self)
        }
    }

    pub fn send_message(&mut self, ctx: &T::Context, body: &[u8]) -> Result<()> {
        self.peer.send_message(ctx, body)
    }

    pub fn unwrap_message(&mut self, raw: &[u8]) -> Result<Vec<u8>> {
        self.peer.unwrap_message(raw)
    }

    pub fn remote_endpoint(&self) -> &[u8] {
        self.peer.remote_endpoint()
    }

    /// The underlying channel regardless of phase.
    pub fn peer(&self) -> &EstablishedPeer<T> {
        &self.peer
    }
}

/// A [`PeerHandle`] behind one lock, for callers that share a peer between
/// threads. Every mutating call holds the lock for its full duration, so no
/// two messages can be sealed under the same nonce.
pub struct SharedPeer<T: Transport> {
    inner: Arc<Mutex<PeerHandle<T>>>,
}

impl<T: Transport> Clone for SharedPeer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Transport> SharedPeer<T> {
    pub fn new(handle: PeerHandle<T>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(handle)),
        }
    }

    pub fn status(&self) -> PeerStatus {
        self.inner.lock().status()
    }

    pub fn continue_key_exchange<I: Identity + ?Sized>(
        &self,
        identity: &I,
        ctx: &T::Context,
        raw: &[u8],
    ) -> Result<()> {
        self.inner.lock().continue_key_exchange(identity, ctx, raw)
    }

    pub fn send_message(&self, ctx: &T::Context, body: &[u8]) -> Result<()> {
        self.inner.lock().send_message(ctx, body)
    }

    pub fn unwrap_message(&self, raw: &[u8]) -> Result<Vec<u8>> {
        self.inner.lock().unwrap_message(raw)
    }

    pub fn remote_endpoint(&self) -> Vec<u8> {
        self.inner.lock().remote_endpoint().to_vec()
    }

    /// Run `f` with exclusive access to the handle.
    pub fn with<R>(&self, f: impl FnOnce(&mut PeerHandle<T>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Recover the handle if this is the last reference.
    pub fn try_unwrap(self) -> std::result::Result<PeerHandle<T>, Self> {
        Arc::try_unwrap(self.inner)
            .map(Mutex::into_inner)
            .map_err(|inner| Self { inner })
    }
}

impl<T: Transport> From<PeerHandle<T>> for SharedPeer<T> {
    fn from(handle: PeerHandle<T>) -> Self {
        Self::new(handle)
    }
}
