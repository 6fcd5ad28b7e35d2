//! Frame codec for TCP.
//!
//! Splits the byte stream into [`Frame`]s and writes [`Message`]s as frames.

use crate::error::TransportError;
use bytes::{Buf, Bytes, BytesMut};
use mexlink_core::{Frame, FrameHeader, Message};
use tokio_util::codec::{Decoder, Encoder};

/// Length-prefixed, type-tagged framing codec.
///
/// Frame format: `[4-byte length (little-endian)][1-byte tag][payload]`,
/// where the length counts tag and payload.
///
/// The decoder only splits frames; turning a frame into a typed message is
/// left to [`Frame::decode`] so callers see payload errors separately from
/// stream errors.
pub struct FrameCodec {
    max_frame_size: usize,
}

impl FrameCodec {
    /// Creates a new frame codec with the specified maximum frame size.
    ///
    /// # Arguments
    /// * `max_frame_size` - Maximum allowed tag + payload size in bytes
    #[must_use]
    pub fn new(max_frame_size: usize) -> Self {
        Self { max_frame_size }
    }

    /// Returns the maximum frame size.
    #[must_use]
    pub fn max_frame_size(&self) -> usize {
        self.max_frame_size
    }
}

impl Default for FrameCodec {
    fn default() -> Self {
        Self::new(64 * 1024)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < FrameHeader::LENGTH_PREFIX {
            return Ok(None);
        }

        let length = u32::from_le_bytes([src[0], src[1], src[2], src[3]]) as usize;

        if length == 0 {
            return Err(TransportError::invalid_frame(
                "length prefix must cover the type tag",
            ));
        }
        if length > self.max_frame_size {
            return Err(TransportError::frame_too_large(length, self.max_frame_size));
        }

        let total = FrameHeader::LENGTH_PREFIX + length;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(FrameHeader::LENGTH_PREFIX);
        let tag = src.get_u8();
        let payload = src.split_to(length - 1).freeze();

        Ok(Some(Frame { tag, payload }))
    }
}

impl Encoder<&Message> for FrameCodec {
    type Error = TransportError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let start = dst.len();
        item.encode(dst)?;

        let length = dst.len() - start - FrameHeader::LENGTH_PREFIX;
        if length > self.max_frame_size {
            dst.truncate(start);
            return Err(TransportError::frame_too_large(length, self.max_frame_size));
        }
        Ok(())
    }
}

impl Encoder<Bytes> for FrameCodec {
    type Error = TransportError;

    /// Writes an already-encoded frame unchanged.
    fn encode(&mut self, item: Bytes, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let header = FrameHeader::wrap(&item)?;
        if header.frame_len() != item.len() {
            return Err(TransportError::invalid_frame(format!(
                "length prefix says {} bytes, buffer holds {}",
                header.frame_len(),
                item.len()
            )));
        }
        if header.length as usize > self.max_frame_size {
            return Err(TransportError::frame_too_large(
                header.length as usize,
                self.max_frame_size,
            ));
        }
        dst.extend_from_slice(&item);
        Ok(())
    }
}
