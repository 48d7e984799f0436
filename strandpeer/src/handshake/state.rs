// Key exchange state machine.
//
//   ActivelyWaitForPublicKey  ─┐
//                              ├─> Done    (transport cipher ready)
//   PassivelyWaitForPublicKey ─┘    Failed  (sticky; no edge back)
//
// Ephemeral key material lives only inside the waiting states and the
// transport cipher only inside `Done`, so neither can outlive its phase.

use crate::codec::TransportCipher;
use crate::crypto::x25519::EphemeralKeyPair;

/// Which side of the handshake this peer plays. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Sends the first signed public key immediately.
    ActiveInitiator,
    /// Waits for the initiator, then replies with its own signed public key.
    PassiveResponder,
}

/// Externally observable phase of a key exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    ActivelyWaitForPublicKey,
    PassivelyWaitForPublicKey,
    Failed,
    Done,
}

impl Phase {
    pub fn is_waiting(self) -> bool {
        matches!(
            self,
            Phase::ActivelyWaitForPublicKey | Phase::PassivelyWaitForPublicKey
        )
    }

    pub fn is_terminal(self) -> bool {
        !self.is_waiting()
    }

    /// Human-readable label for the phase (used in error messages).
    pub fn label(self) -> &'static str {
        match self {
            Phase::ActivelyWaitForPublicKey => "ActivelyWaitForPublicKey",
            Phase::PassivelyWaitForPublicKey => "PassivelyWaitForPublicKey",
            Phase::Failed => "Failed",
            Phase::Done => "Done",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The current state of a key exchange, with the secrets owned by each phase.
#[derive(Debug)]
pub enum KeyExchangeState {
    /// Initiator has sent its signed public key, waiting for the responder's.
    ActivelyWaitForPublicKey {
        /// Local ephemeral X25519 keypair, consumed by the DH step.
        ephemeral: EphemeralKeyPair,
    },

    /// Responder is waiting for the initiator's signed public key.
    PassivelyWaitForPublicKey {
        ephemeral: EphemeralKeyPair,
    },

    /// Terminal failure.
    Failed,

    /// Handshake complete.
    Done {
        cipher: TransportCipher,
    },
}

impl KeyExchangeState {
    /// Initial waiting state for `role`.
    pub fn waiting(role: Role, ephemeral: EphemeralKeyPair) -> Self {
        match role {
            Role::ActiveInitiator => KeyExchangeState::ActivelyWaitForPublicKey { ephemeral },
            Role::PassiveResponder => KeyExchangeState::PassivelyWaitForPublicKey { ephemeral },
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            KeyExchangeState::ActivelyWaitForPublicKey { .. } => Phase::ActivelyWaitForPublicKey,
            KeyExchangeState::PassivelyWaitForPublicKey { .. } => Phase::PassivelyWaitForPublicKey,
            KeyExchangeState::Failed => Phase::Failed,
            KeyExchangeState::Done { .. } => Phase::Done,
        }
    }

    /// Move the ephemeral keypair out of a waiting state, leaving `Failed`
    /// behind until the caller installs `Done`. Any other state is left
    /// untouched and `None` is returned.
    pub fn take_ephemeral(&mut self) -> Option<EphemeralKeyPair> {
        if !self.phase().is_waiting() {
            return None;
        }
        match std::mem::replace(self, KeyExchangeState::Failed) {
            KeyExchangeState::ActivelyWaitForPublicKey { ephemeral }
            | KeyExchangeState::PassivelyWaitForPublicKey { ephemeral } => Some(ephemeral),
            _ => None,
        }
    }

    pub fn cipher(&self) -> Option<&TransportCipher> {
        match self {
            KeyExchangeState::Done { cipher } => Some(cipher),
            _ => None,
        }
    }

    pub fn cipher_mut(&mut self) -> Option<&mut TransportCipher> {
        match self {
            KeyExchangeState::Done { cipher } => Some(cipher),
            _ => None,
        }
    }
}
