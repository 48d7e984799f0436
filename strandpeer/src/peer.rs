// A channel to one remote peer: signed X25519 handshake, then sequenced AEAD.
//
// `EstablishedPeer` is a passive state machine. Every call runs to completion
// synchronously; the only outward effect is `Transport::send`. Mutating calls
// take `&mut self`, so concurrent use of one peer needs a lock held by the
// caller (see `SharedPeer`).

use bytes::Bytes;
use tracing::{debug, warn};

use crate::capability::{Identity, Transport};
use crate::codec::TransportCipher;
use crate::config::PeerConfig;
use crate::crypto::hash::{to_hex, FINGERPRINT_LEN};
use crate::crypto::x25519::EphemeralKeyPair;
use crate::error::{PeerError, Result};
use crate::handshake::messages::{encode_signed_public_key, SignedPublicKey};
use crate::handshake::state::{KeyExchangeState, Phase, Role};

/// Secure channel over `T`, from handshake start to teardown.
#[derive(Debug)]
pub struct EstablishedPeer<T: Transport> {
    transport: T,
    role: Role,
    config: PeerConfig,
    state: KeyExchangeState,
}

impl<T: Transport> EstablishedPeer<T> {
    /// Start a key exchange with the default configuration.
    ///
    /// An `ActiveInitiator` signs and sends its ephemeral public key at once;
    /// a `PassiveResponder` sends nothing until the initiator's key arrives.
    /// If the initial send fails no peer is returned.
    pub fn establish<I: Identity + ?Sized>(
        identity: &I,
        transport: T,
        ctx: &T::Context,
        role: Role,
    ) -> Result<Self> {
        Self::establish_with_config(identity, transport, ctx, role, PeerConfig::default())
    }

    /// Start a key exchange with an explicit configuration. Both peers must
    /// use the same `config`.
    pub fn establish_with_config<I: Identity + ?Sized>(
        identity: &I,
        transport: T,
        ctx: &T::Context,
        role: Role,
        config: PeerConfig,
    ) -> Result<Self> {
        let ephemeral = EphemeralKeyPair::generate();

        if role == Role::ActiveInitiator {
            let hello = encode_signed_public_key(identity, &ephemeral.public_key_bytes())?;
            transport
                .send(ctx, Bytes::from(hello))
                .map_err(PeerError::transport)?;
        }

        debug!(?role, suite = config.cipher_suite.name(), "key exchange started");

        Ok(Self {
            transport,
            role,
            config,
            state: KeyExchangeState::waiting(role, ephemeral),
        })
    }

    /// Feed one handshake message received from the transport.
    ///
    /// A bad signature (or a message too short to carry one) is reported
    /// without changing the phase. Failures after the signature check leave
    /// the exchange in the sticky `Failed` phase; later calls return
    /// [`PeerError::PreviouslyFailed`] without doing any work.
    pub fn continue_key_exchange<I: Identity + ?Sized>(
        &mut self,
        identity: &I,
        ctx: &T::Context,
        raw: &[u8],
    ) -> Result<()> {
        match self.state.phase() {
            Phase::ActivelyWaitForPublicKey | Phase::PassivelyWaitForPublicKey => {}
            Phase::Failed => return Err(PeerError::PreviouslyFailed),
            Phase::Done => {
                return Err(PeerError::InvalidStateTransition {
                    from: Phase::Done.label().into(),
                    to: Phase::Done.label().into(),
                })
            }
        }

        let message = SignedPublicKey::split(raw, identity.signature_size())?;
        if let Err(e) = message.verify(identity, self.transport.remote_endpoint()) {
            warn!(role = ?self.role, "rejected handshake message with bad signature");
            return Err(e);
        }

        // From here on the state reads `Failed` until the cipher is installed.
        let ephemeral = self
            .state
            .take_ephemeral()
            .ok_or_else(|| PeerError::InvalidStateTransition {
                from: self.state.phase().label().into(),
                to: Phase::Done.label().into(),
            })?;
        let local_public = ephemeral.public_key_bytes();

        let shared = ephemeral
            .diffie_hellman(message.public_key)
            .map_err(|e| self.fail(e))?;

        if self.role == Role::PassiveResponder {
            let reply = encode_signed_public_key(identity, &local_public)
                .map_err(|e| self.fail(PeerError::reply(e)))?;
            self.transport
                .send(ctx, Bytes::from(reply))
                .map_err(|e| self.fail(PeerError::reply(PeerError::transport(e))))?;
        }

        let cipher = TransportCipher::new(&self.config, &shared).map_err(|e| self.fail(e))?;
        drop(shared);

        debug!(
            role = ?self.role,
            fingerprint = %to_hex(&cipher.fingerprint()),
            "key exchange done"
        );
        self.state = KeyExchangeState::Done { cipher };
        Ok(())
    }

    fn fail(&mut self, err: PeerError) -> PeerError {
        self.state = KeyExchangeState::Failed;
        debug!(role = ?self.role, error = %err, "key exchange failed");
        err
    }

    /// Seal `body` under the next send nonce and hand it to the transport.
    ///
    /// The nonce is consumed even if the transport send fails.
    pub fn send_message(&mut self, ctx: &T::Context, body: &[u8]) -> Result<()> {
        let cipher = self.cipher_mut()?;
        let sealed = cipher.seal(body)?;
        self.transport
            .send(ctx, Bytes::from(sealed))
            .map_err(PeerError::transport)
    }

    /// Authenticate and decrypt the next inbound transport message.
    ///
    /// The receive nonce is consumed even on failure: a lost, reordered or
    /// corrupted message leaves every later message undecryptable.
    pub fn unwrap_message(&mut self, raw: &[u8]) -> Result<Vec<u8>> {
        self.cipher_mut()?.open(raw)
    }

    fn cipher_mut(&mut self) -> Result<&mut TransportCipher> {
        let phase = self.state.phase();
        self.state
            .cipher_mut()
            .ok_or_else(|| PeerError::NotEstablished {
                state: phase.label().into(),
            })
    }

    /// Token naming the remote peer, as reported by the transport.
    pub fn remote_endpoint(&self) -> &[u8] {
        self.transport.remote_endpoint()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn config(&self) -> &PeerConfig {
        &self.config
    }

    pub fn is_established(&self) -> bool {
        self.phase() == Phase::Done
    }

    /// Short hash of the transport key, equal on both ends once `Done`.
    pub fn session_fingerprint(&self) -> Option<[u8; FINGERPRINT_LEN]> {
        self.state.cipher().map(TransportCipher::fingerprint)
    }

    /// Next (send, receive) counter values, once `Done`.
    pub fn counters(&self) -> Option<(u64, u64)> {
        self.state
            .cipher()
            .map(|c| (c.send_counter(), c.recv_counter()))
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
