//! The plain message converter: a pure mapping between a decoded [`Frame`]
//! and a typed [`Message`], with no encryption involved.

use bytes::Bytes;

use crate::error::WireError;
use crate::frame::Frame;
use crate::message::{ChatMessageId, Message, CHAT_MESSAGE_ID_LEN};

const TAG_KEY: u8 = b'K';
const TAG_SESSION_END: u8 = b'S';
const TAG_USER_INFO: u8 = b'U';
const TAG_NEW_CHAT_MESSAGE: u8 = b'N';
const TAG_EDIT_CHAT_MESSAGE: u8 = b'E';

/// Decode a frame's tag + body into a typed [`Message`].
pub fn decode(frame: &Frame) -> Result<Message, WireError> {
    decode_tagged(frame.tag, &frame.body)
}

fn decode_tagged(tag: u8, body: &[u8]) -> Result<Message, WireError> {
    match tag {
        TAG_KEY => Ok(Message::Key(body.to_vec())),
        TAG_USER_INFO => Ok(Message::UserInfo(decode_utf8(body)?)),
        TAG_SESSION_END => Ok(Message::SessionEnd),
        TAG_NEW_CHAT_MESSAGE => decode_chat(body).map(|(id, content)| Message::NewChatMessage { id, content }),
        TAG_EDIT_CHAT_MESSAGE => decode_chat(body).map(|(id, content)| Message::EditChatMessage { id, content }),
        other => Err(WireError::UnknownType(other)),
    }
}

fn decode_utf8(body: &[u8]) -> Result<String, WireError> {
    std::str::from_utf8(body)
        .map(str::to_owned)
        .map_err(|e| WireError::MalformedFrame(format!("body is not valid UTF-8: {e}")))
}

fn decode_chat(body: &[u8]) -> Result<(ChatMessageId, String), WireError> {
    if body.len() < CHAT_MESSAGE_ID_LEN + 1 {
        return Err(WireError::MalformedFrame(format!(
            "chat message body must be at least {} bytes, got {}",
            CHAT_MESSAGE_ID_LEN + 1,
            body.len()
        )));
    }
    let mut id_bytes = [0u8; CHAT_MESSAGE_ID_LEN];
    id_bytes.copy_from_slice(&body[..CHAT_MESSAGE_ID_LEN]);
    let content = decode_utf8(&body[CHAT_MESSAGE_ID_LEN..])?;
    Ok((ChatMessageId::from_bytes(id_bytes), content))
}

/// Serialize a [`Message`] into its tag and raw body bytes, inverting
/// [`decode`]. Callers frame the result with [`crate::frame::encode`].
pub fn encode(message: &Message) -> (u8, Bytes) {
    match message {
        Message::Key(key) => (TAG_KEY, Bytes::from(key.clone())),
        Message::UserInfo(username) => (TAG_USER_INFO, Bytes::from(username.clone().into_bytes())),
        Message::SessionEnd => (TAG_SESSION_END, Bytes::new()),
        Message::NewChatMessage { id, content } => (TAG_NEW_CHAT_MESSAGE, encode_chat(id, content)),
        Message::EditChatMessage { id, content } => (TAG_EDIT_CHAT_MESSAGE, encode_chat(id, content)),
    }
}

fn encode_chat(id: &ChatMessageId, content: &str) -> Bytes {
    let mut body = Vec::with_capacity(CHAT_MESSAGE_ID_LEN + content.len());
    body.extend_from_slice(id.as_bytes());
    body.extend_from_slice(content.as_bytes());
    Bytes::from(body)
}
