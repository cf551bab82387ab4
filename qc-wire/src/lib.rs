//! Wire framing and message taxonomy for the quietchat protocol.
//!
//! This crate handles:
//! * Length-prefixed frame encode/decode ([`frame`])
//! * The five-variant [`Message`] taxonomy and chat-message id generation
//! * Plain ([`plain`]) and encrypted ([`encrypted`]) converters between a
//!   decoded frame and a typed message
//!
//! It is intentionally transport-agnostic: bring your own byte stream.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod encrypted;
pub mod error;
pub mod frame;
pub mod message;
pub mod plain;

pub use encrypted::{Converter, Decryptor, Encryptor};
pub use error::WireError;
pub use frame::{Frame, FrameDecoder};
pub use message::{ChatMessageId, Message};
