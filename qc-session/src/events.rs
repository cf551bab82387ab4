//! Session-observable occurrences, delivered over an `mpsc` channel in place
//! of the source's Qt signals.

use qc_wire::ChatMessageId;

use crate::error::SessionError;
use crate::user_info::UserInfo;

/// An occurrence a [`crate::session::ChatSession`] reports to its owner.
#[derive(Debug)]
pub enum SessionEvent {
    /// The underlying connection is open and a handshake processor may now
    /// be attached via `initialize`.
    ConnectionEstablished,
    /// The handshake completed; the session is in the `Initialized` phase
    /// and `send_message` may now be used.
    SessionInitialized {
        /// The peer's announced identity.
        peer: UserInfo,
    },
    /// The handshake failed; the session never reached `Initialized`.
    SessionInitializationError(HandshakeFailure),
    /// The peer ended the session, or the transport disconnected after the
    /// session had already initialized.
    SessionEndedByOtherSide,
    /// A frame failed to decode, or carried a message that is illegal in the
    /// current phase. The session is not torn down by this alone.
    InvalidMessageReceived(SessionError),
    /// A new chat message arrived from the peer.
    NewChatMessageReceived {
        /// The message's id.
        id: ChatMessageId,
        /// The message's content.
        content: String,
    },
    /// An edit to a previously received chat message arrived from the peer.
    EditedChatMessageReceived {
        /// The id of the edited message.
        id: ChatMessageId,
        /// The updated content.
        content: String,
    },
}

/// Why a handshake failed to complete, surfaced alongside
/// [`SessionEvent::SessionInitializationError`].
#[derive(Debug)]
pub enum HandshakeFailure {
    /// The handshake processor itself rejected the exchange.
    Protocol(crate::error::HandshakeError),
    /// The transport disconnected before the handshake finished.
    Disconnected,
}

impl std::fmt::Display for HandshakeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HandshakeFailure::Protocol(e) => write!(f, "{e}"),
            HandshakeFailure::Disconnected => write!(f, "peer disconnected during handshake"),
        }
    }
}
