//! Message encoding and decoding with framing.
//!
//! Frame format: [length: u32 LE][message_type: u8][payload: postcard bytes].
//! The length covers the tag and the payload, not itself.

use crate::protocol::InputMessage;
use anyhow::{bail, Context, Result};

/// Message type tag for [`InputMessage`] frames.
pub const INPUT_MESSAGE_TAG: u8 = 1;

/// Upper bound on an encoded frame; an input message is a few dozen bytes.
pub const MAX_FRAME_LEN: usize = 256;

const HEADER_LEN: usize = 4;

/// Encode an input message with length prefix.
pub fn encode_input_frame(msg: &InputMessage) -> Result<Vec<u8>> {
    let payload = postcard::to_allocvec(msg).context("Failed to serialize input message")?;

    let mut frame = Vec::with_capacity(HEADER_LEN + 1 + payload.len());
    let length = (1 + payload.len()) as u32;
    frame.extend_from_slice(&length.to_le_bytes());
    frame.push(INPUT_MESSAGE_TAG);
    frame.extend_from_slice(&payload);

    Ok(frame)
}

/// Decode an input message from a single frame.
pub fn decode_input_frame(data: &[u8]) -> Result<InputMessage> {
    if data.len() < HEADER_LEN + 1 {
        bail!(
            "Frame too short: {} bytes (minimum {})",
            data.len(),
            HEADER_LEN + 1
        );
    }
    if data.len() > MAX_FRAME_LEN {
        bail!("Frame too large: {} bytes (maximum {MAX_FRAME_LEN})", data.len());
    }

    let length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if length == 0 {
        bail!("Frame declares zero length");
    }
    if data.len() < HEADER_LEN + length {
        bail!(
            "Incomplete frame: expected {} bytes, got {}",
            HEADER_LEN + length,
            data.len()
        );
    }

    let tag = data[HEADER_LEN];
    if tag != INPUT_MESSAGE_TAG {
        bail!("Unexpected message tag {tag}");
    }

    let payload = &data[HEADER_LEN + 1..HEADER_LEN + length];
    postcard::from_bytes(payload).context("Failed to deserialize input message")
}
