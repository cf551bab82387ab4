//! The five-variant message taxonomy exchanged over the wire.

use rand::Rng;

/// Length in bytes of a chat-message id.
pub const CHAT_MESSAGE_ID_LEN: usize = 8;

/// An 8-lowercase-letter identifier for a chat message, generated by the
/// sender of a [`Message::NewChatMessage`] and referenced by later
/// [`Message::EditChatMessage`]s for the same message.
///
/// Generated with a non-cryptographic RNG; collisions are possible and are
/// tolerated by the protocol (a colliding edit silently overwrites the
/// earlier message on receipt). This is acceptable given how short a chat
/// session typically runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChatMessageId([u8; CHAT_MESSAGE_ID_LEN]);

impl ChatMessageId {
    /// Generate a fresh id from `b'a'..=b'z'`.
    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let mut bytes = [0u8; CHAT_MESSAGE_ID_LEN];
        for b in &mut bytes {
            *b = rng.gen_range(b'a'..=b'z');
        }
        Self(bytes)
    }

    /// Build an id from raw bytes, as received in an `N`/`E` frame body.
    /// Does not validate that every byte is `a`-`z`; the wire format does
    /// not enforce this either (see spec.md §3).
    pub fn from_bytes(bytes: [u8; CHAT_MESSAGE_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// The raw id bytes.
    pub fn as_bytes(&self) -> &[u8; CHAT_MESSAGE_ID_LEN] {
        &self.0
    }
}

impl std::fmt::Display for ChatMessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The id is constructed only from `a'..=z'`, but fall back to lossy
        // display so a malformed id received from the wire still prints.
        write!(f, "{}", String::from_utf8_lossy(&self.0))
    }
}

/// The closed set of message types the protocol exchanges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Carries an encoded key: either the ASCII bytes of a PEM-encoded RSA
    /// public key, or raw symmetric key bytes. Which one it is is
    /// determined positionally by the handshake, not by anything in the
    /// frame itself. Modeled as raw bytes rather than `String` because the
    /// symmetric-key case is not valid UTF-8 in general.
    Key(Vec<u8>),
    /// Announces that the sender is ending the session. Carries no payload.
    SessionEnd,
    /// Carries the sender's username.
    UserInfo(String),
    /// A new chat message with a freshly generated id and its content.
    NewChatMessage {
        /// Id of the new message.
        id: ChatMessageId,
        /// The message text.
        content: String,
    },
    /// An edit to a previously sent chat message, referenced by id.
    EditChatMessage {
        /// Id of the message being edited.
        id: ChatMessageId,
        /// The new message text.
        content: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_lowercase_ascii() {
        let id = ChatMessageId::generate();
        assert!(id.as_bytes().iter().all(|b| b.is_ascii_lowercase()));
        assert_eq!(id.as_bytes().len(), CHAT_MESSAGE_ID_LEN);
    }
}
