//! Frame header.

use crate::error::{Error, Result};

/// Header that precedes every payload on the wire (5 bytes).
///
/// # Wire Format
/// ```text
/// +0: length  (u32 LE, counts tag + payload)
/// +4: tag     (u8, message type)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Byte count of tag + payload.
    pub length: u32,
    /// Raw message type tag.
    pub tag: u8,
}

impl FrameHeader {
    /// Encoded length of the header in bytes.
    pub const ENCODED_LENGTH: usize = 5;

    /// Size of the length prefix alone.
    pub const LENGTH_PREFIX: usize = 4;

    /// Creates a header for a payload of `payload_len` bytes.
    #[must_use]
    pub const fn new(tag: u8, payload_len: u32) -> Self {
        Self {
            length: payload_len + 1,
            tag,
        }
    }

    /// Reads a header from the start of `buffer`.
    ///
    /// # Errors
    /// Returns `BufferTooShort` if fewer than 5 bytes are available and
    /// `EmptyFrame` if the length prefix does not cover the tag.
    pub fn wrap(buffer: &[u8]) -> Result<Self> {
        if buffer.len() < Self::ENCODED_LENGTH {
            return Err(Error::BufferTooShort {
                required: Self::ENCODED_LENGTH,
                available: buffer.len(),
            });
        }
        let length = u32::from_le_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]);
        if length == 0 {
            return Err(Error::EmptyFrame);
        }
        Ok(Self {
            length,
            tag: buffer[4],
        })
    }

    /// Writes the header into the first 5 bytes of `buffer`.
    ///
    /// # Panics
    /// Panics if the buffer is shorter than 5 bytes.
    pub fn encode(&self, buffer: &mut [u8]) {
        buffer[..4].copy_from_slice(&self.length.to_le_bytes());
        buffer[4] = self.tag;
    }

    /// Returns the payload length.
    #[must_use]
    pub const fn payload_len(&self) -> usize {
        self.length as usize - 1
    }

    /// Returns the total frame size including the length prefix.
    #[must_use]
    pub const fn frame_len(&self) -> usize {
        Self::LENGTH_PREFIX + self.length as usize
    }
}
