//! Spill frame layout
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, includes this field and the checksum)
//! +------------------+
//! | Body             | (codec output)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers the length field and the body.

use super::checksum::{compute_checksum, compute_checksum_parts};
use crate::stream::{StreamError, StreamResult};

/// Length field plus checksum.
pub const FRAME_OVERHEAD: usize = 4 + 4;

/// Appends one framed body to `out`. Returns the frame length.
pub fn encode_frame(body: &[u8], out: &mut Vec<u8>) -> StreamResult<usize> {
    let frame_length = FRAME_OVERHEAD + body.len();
    let length_field = u32::try_from(frame_length)
        .map_err(|_| StreamError::codec(format!("Frame too large: {} bytes", frame_length)))?
        .to_le_bytes();

    let checksum = compute_checksum_parts(&length_field, body);

    out.reserve(frame_length);
    out.extend_from_slice(&length_field);
    out.extend_from_slice(body);
    out.extend_from_slice(&checksum.to_le_bytes());

    Ok(frame_length)
}

/// Parses the length field, rejecting values that cannot be a frame.
pub fn parse_length(offset: u64, length_field: [u8; 4], remaining: u64) -> StreamResult<usize> {
    let frame_length = u32::from_le_bytes(length_field) as u64;

    if frame_length < FRAME_OVERHEAD as u64 {
        return Err(StreamError::corruption_at_offset(
            offset,
            format!("Invalid frame length: {}", frame_length),
        ));
    }
    if frame_length > remaining {
        return Err(StreamError::corruption_at_offset(
            offset,
            format!(
                "Frame length {} exceeds remaining spill size {}",
                frame_length, remaining
            ),
        ));
    }

    Ok(frame_length as usize)
}

/// Verifies a complete frame and returns its body.
pub fn decode_frame(offset: u64, frame: &[u8]) -> StreamResult<&[u8]> {
    if frame.len() < FRAME_OVERHEAD {
        return Err(StreamError::corruption_at_offset(offset, "Frame too short"));
    }

    let checksum_offset = frame.len() - 4;
    let mut stored = [0u8; 4];
    stored.copy_from_slice(&frame[checksum_offset..]);
    let stored_checksum = u32::from_le_bytes(stored);
    let computed_checksum = compute_checksum(&frame[..checksum_offset]);

    if computed_checksum != stored_checksum {
        return Err(StreamError::corruption_at_offset(
            offset,
            format!(
                "Checksum mismatch: computed {:08x}, stored {:08x}",
                computed_checksum, stored_checksum
            ),
        ));
    }

    Ok(&frame[4..checksum_offset])
}
