//! Error kinds surfaced by the handshake processor and the session
//! controller.

use thiserror::Error;

/// Errors raised while driving a [`crate::handshake::HandshakeProcessor`].
///
/// Not `Clone`/`Eq` because it wraps [`qc_crypto::CryptoError`], which isn't
/// either; tests match on variants instead of comparing whole errors.
#[derive(Debug, Error)]
pub enum HandshakeError {
    /// The responder received a `UserInfo` before an inbound `Key`.
    #[error("received UserInfo before a Key message")]
    DataBeforeKey,
    /// A second `Key` message arrived after one had already been processed.
    #[error("received a duplicate Key message")]
    DuplicateKey,
    /// The peer sent `SessionEnd` while the handshake was still in progress.
    #[error("peer ended the session during handshake")]
    HandshakeTerminated,
    /// A message arrived on a processor that had already finished or failed.
    #[error("handshake already finished")]
    AlreadyFinished,
    /// Chat traffic (`NewChatMessage`/`EditChatMessage`) arrived before the
    /// handshake completed.
    #[error("chat traffic is not valid during handshake: {0}")]
    MalformedFrame(String),
    /// The wire layer failed to decode or encode a frame.
    #[error("wire error: {0}")]
    Wire(#[from] qc_wire::WireError),
    /// A cryptographic operation (PEM decode, RSA seal/open, key parse)
    /// failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] qc_crypto::CryptoError),
}

/// Errors raised during the data phase of a [`crate::session::ChatSession`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// A `Key` message arrived outside the handshake.
    #[error("received a Key message outside the handshake")]
    DuplicateKey,
    /// An unrecognized frame tag was received.
    #[error("unknown message type: {0:#x}")]
    UnknownType(u8),
    /// A frame failed to decode.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    /// The transport reported a disconnect.
    #[error("transport closed")]
    TransportClosed,
}

impl From<qc_wire::WireError> for SessionError {
    fn from(err: qc_wire::WireError) -> Self {
        match err {
            qc_wire::WireError::UnknownType(tag) => SessionError::UnknownType(tag),
            qc_wire::WireError::MalformedFrame(msg) => SessionError::MalformedFrame(msg),
        }
    }
}
