//! Protocol-level errors shared by the frame codec and message converters.

/// Errors raised while decoding frames or converting them to/from typed
/// [`crate::Message`]s.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Declared frame length is not valid hex, shorter than the 8-byte
    /// header, the magic bytes are not `QC`, or a typed body has the wrong
    /// length for its tag.
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    /// The frame's type tag does not match any known message variant.
    #[error("unknown message type tag {0:#04x}")]
    UnknownType(u8),
}
