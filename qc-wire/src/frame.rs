//! Length-prefixed frame codec.
//!
//! Wire layout: `[5 ASCII hex digits: total length N][b"QC"][1 byte: tag][N - 8 bytes: body]`.
//! `N` counts the whole frame including the 8-byte header and must lie in
//! `[MIN_FRAME_LEN, MAX_FRAME_LEN]`.

use bytes::{Bytes, BytesMut};

use crate::error::WireError;

/// Magic bytes that follow the length field in every frame.
pub const MAGIC: &[u8; 2] = b"QC";

/// Size of the frame header: 5 hex digits + 2 magic bytes + 1 tag byte.
pub const HEADER_LEN: usize = 8;

/// Smallest legal declared frame length (header with an empty body).
pub const MIN_FRAME_LEN: usize = HEADER_LEN;

/// Largest declared frame length representable in 5 hex digits.
pub const MAX_FRAME_LEN: usize = 0xF_FFFF;

/// A single decoded frame: its type tag and body, with framing already
/// stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// The one-byte type tag (`K`, `U`, `S`, `N`, or `E`; unrecognized tags
    /// still decode to a `Frame` and are rejected later by the converter).
    pub tag: u8,
    /// The frame body, with the 8-byte header removed.
    pub body: Bytes,
}

/// Encode `tag` + `body` into a complete framed byte string.
pub fn encode(tag: u8, body: &[u8]) -> Bytes {
    let total_len = HEADER_LEN + body.len();
    let mut out = BytesMut::with_capacity(total_len);
    out.extend_from_slice(format!("{total_len:05x}").as_bytes());
    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&[tag]);
    out.extend_from_slice(body);
    out.freeze()
}

/// Parse the 5-hex-digit length prefix of a buffer that is known to have at
/// least 5 bytes. Accepts upper- or lower-case hex.
fn parse_len(buf: &[u8]) -> Result<usize, WireError> {
    let text = std::str::from_utf8(&buf[..5])
        .map_err(|_| WireError::MalformedFrame("length field is not ASCII".into()))?;
    usize::from_str_radix(text, 16)
        .map_err(|_| WireError::MalformedFrame(format!("length field {text:?} is not hex")))
}

/// Incremental decoder over a growing byte buffer.
///
/// Feed it arbitrary chunks from a byte stream via [`push`](Self::push); it
/// returns every frame that became complete as a result, in wire order, and
/// retains any trailing partial frame for the next call.
#[derive(Default)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl FrameDecoder {
    /// Create an empty decoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed `chunk` into the decoder and drain every frame that is now
    /// complete.
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<Frame>, WireError> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        loop {
            if self.buf.len() < 5 {
                break;
            }

            let total_len = parse_len(&self.buf)?;
            if !(MIN_FRAME_LEN..=MAX_FRAME_LEN).contains(&total_len) {
                return Err(WireError::MalformedFrame(format!(
                    "declared length {total_len} out of range [{MIN_FRAME_LEN}, {MAX_FRAME_LEN}]"
                )));
            }

            if self.buf.len() < total_len {
                break;
            }

            let frame_bytes = self.buf.split_to(total_len);
            if &frame_bytes[5..7] != MAGIC {
                return Err(WireError::MalformedFrame("magic bytes are not QC".into()));
            }

            let tag = frame_bytes[7];
            let body = frame_bytes.freeze().slice(HEADER_LEN..);
            tracing::debug!(tag = tag as char, len = total_len, "decoded frame");
            frames.push(Frame { tag, body });
        }

        Ok(frames)
    }
}
