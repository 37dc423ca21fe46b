//! gRPC length-prefixed message framing.
//!
//! ```text
//! +------+-----------+-----------------+
//! | flag | length    | payload         |
//! | 1B   | 4B (BE)   | length bytes    |
//! +------+-----------+-----------------+
//! ```
//!
//! The flag byte is always written as 0 (uncompressed).

use bytes::Bytes;

use crate::error::FrameError;

/// Size of the flag + length prefix.
pub const FRAME_HEADER_SIZE: usize = 5;

/// Flag value for an uncompressed message.
pub const FLAG_UNCOMPRESSED: u8 = 0;

/// Flag value for a compressed message. Never produced here.
pub const FLAG_COMPRESSED: u8 = 1;

/// How strictly [`decode`] treats the length prefix.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LengthCheck {
    /// The declared length must match the bytes that follow, and the flag
    /// must be uncompressed.
    #[default]
    Strict,
    /// Everything after the prefix is the payload; the length field and the
    /// flag are ignored.
    Lenient,
}

/// Encode a gRPC length-prefixed message into `out`.
pub fn encode(payload: &[u8], out: &mut Vec<u8>) {
    debug_assert!(payload.len() <= u32::MAX as usize);
    out.reserve(FRAME_HEADER_SIZE + payload.len());
    out.push(FLAG_UNCOMPRESSED);
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
}

/// Encode a gRPC length-prefixed message into a fresh buffer.
pub fn encode_to_bytes(payload: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    encode(payload, &mut out);
    Bytes::from(out)
}

/// Total frame size announced by the prefix (prefix included).
///
/// Returns `None` if fewer than [`FRAME_HEADER_SIZE`] bytes are available.
pub fn declared_len(frame: &[u8]) -> Option<usize> {
    if frame.len() < FRAME_HEADER_SIZE {
        return None;
    }
    let length = u32::from_be_bytes([frame[1], frame[2], frame[3], frame[4]]) as usize;
    Some(FRAME_HEADER_SIZE + length)
}

/// Strip the prefix from a single complete frame and return the payload.
pub fn decode(frame: &[u8], check: LengthCheck) -> Result<&[u8], FrameError> {
    let Some(declared) = declared_len(frame) else {
        return Err(FrameError::TooShort { len: frame.len() });
    };

    if check == LengthCheck::Strict {
        if frame[0] != FLAG_UNCOMPRESSED {
            return Err(FrameError::Compressed { flag: frame[0] });
        }
        if declared != frame.len() {
            return Err(FrameError::LengthMismatch {
                declared: declared - FRAME_HEADER_SIZE,
                actual: frame.len() - FRAME_HEADER_SIZE,
            });
        }
    }

    Ok(&frame[FRAME_HEADER_SIZE..])
}
