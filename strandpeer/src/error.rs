// StrandPeer error types

use thiserror::Error;

/// Boxed error reported by a [`Transport`](crate::capability::Transport) implementation.
pub type TransportFailure = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for the StrandPeer crate.
#[derive(Debug, Error)]
pub enum PeerError {
    // ── Transport capability ────────────────────────────────────────────
    #[error("transport send failed: {0}")]
    Transport(#[source] TransportFailure),

    // ── Handshake errors ────────────────────────────────────────────────
    #[error("handshake message too short: need at least {need} bytes, have {have}")]
    MessageTooShort { need: usize, have: usize },

    #[error("identity produced a {actual}-byte signature, expected {expected}")]
    SignatureLength { expected: usize, actual: usize },

    #[error("signature verification failed")]
    SignatureVerification,

    #[error("key agreement failed: {0}")]
    KeyAgreement(String),

    #[error("cipher initialisation failed: {0}")]
    CipherInit(String),

    #[error("handshake reply failed: {0}")]
    ReplyFailed(#[source] Box<PeerError>),

    #[error("key exchange failed previously")]
    PreviouslyFailed,

    #[error("invalid key exchange state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    // ── Transport codec errors ──────────────────────────────────────────
    #[error("channel not established (key exchange is {state})")]
    NotEstablished { state: String },

    #[error("AEAD encryption failed: {0}")]
    Encryption(String),

    #[error("AEAD decryption failed: {0}")]
    Decryption(String),

    #[error("nonce counter exhausted")]
    NonceExhausted,

    // ── Configuration ───────────────────────────────────────────────────
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl PeerError {
    pub(crate) fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        PeerError::Transport(Box::new(err))
    }

    /// Wrap an error raised while the passive responder sends its reply.
    pub(crate) fn reply(err: PeerError) -> Self {
        PeerError::ReplyFailed(Box::new(err))
    }

    /// True for errors returned by a key exchange that is now permanently
    /// `Failed`. A plain `Transport` error is never terminal: it comes from
    /// `establish` (which returns no peer) or from `send_message`.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PeerError::KeyAgreement(_)
                | PeerError::CipherInit(_)
                | PeerError::ReplyFailed(_)
                | PeerError::PreviouslyFailed
        )
    }
}

/// Crate-level result alias.
pub type Result<T> = std::result::Result<T, PeerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_failure_is_terminal_but_plain_transport_is_not() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "link down");
        let plain = PeerError::transport(io);
        assert!(!plain.is_terminal());

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "link down");
        let wrapped = PeerError::reply(PeerError::transport(io));
        assert!(wrapped.is_terminal());
        assert_eq!(
            wrapped.to_string(),
            "handshake reply failed: transport send failed: link down"
        );
        assert!(std::error::Error::source(&wrapped).is_some());
    }

    #[test]
    fn bad_signature_is_not_terminal() {
        assert!(!PeerError::SignatureVerification.is_terminal());
        assert!(!PeerError::MessageTooShort { need: 64, have: 3 }.is_terminal());
    }
}
