//! Schema registry wire framing.
//!
//! ```text
//! byte 0      magic byte, always 0
//! bytes 1..5  schema id, u32 big-endian
//! bytes 5..   payload
//! ```

use crate::error::{DeserializationError, Result};

/// Value of the leading magic byte.
pub const MAGIC_BYTE: u8 = 0;

/// Size of the frame header (magic byte + schema id).
pub const FRAME_HEADER_SIZE: usize = 5;

/// Split a framed payload into its schema id and body.
pub fn parse_frame(data: &[u8]) -> Result<(u32, &[u8])> {
    if data.len() < FRAME_HEADER_SIZE {
        return Err(DeserializationError::FrameTooShort {
            expected: FRAME_HEADER_SIZE,
            actual: data.len(),
        });
    }
    if data[0] != MAGIC_BYTE {
        return Err(DeserializationError::InvalidMagicByte(data[0]));
    }
    let schema_id = u32::from_be_bytes([data[1], data[2], data[3], data[4]]);
    Ok((schema_id, &data[FRAME_HEADER_SIZE..]))
}

/// Prefix a payload with the frame header for `schema_id`.
pub fn encode_frame(schema_id: u32, payload: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(FRAME_HEADER_SIZE + payload.len());
    framed.push(MAGIC_BYTE);
    framed.extend_from_slice(&schema_id.to_be_bytes());
    framed.extend_from_slice(payload);
    framed
}
