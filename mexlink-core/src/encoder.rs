//! Payload encoding.
//!
//! This module provides the [`PayloadEncoder`] trait implemented by every
//! message in the catalogue, and the [`PayloadWriter`] it writes through.

use crate::error::{Error, Result};
use crate::types::MessageType;
use bytes::{BufMut, BytesMut};

/// Trait for messages that can be written as a frame payload.
///
/// Fields are written in declaration order. The order is part of the wire
/// contract and must not change within a protocol version.
pub trait PayloadEncoder {
    /// Type tag written ahead of the payload.
    const MESSAGE_TYPE: MessageType;

    /// Writes the payload fields.
    ///
    /// # Errors
    /// Returns an error if a field cannot be represented on the wire.
    fn encode_payload(&self, writer: &mut PayloadWriter<'_>) -> Result<()>;
}

/// Sequential little-endian writer over a growable byte buffer.
#[derive(Debug)]
pub struct PayloadWriter<'a> {
    buffer: &'a mut BytesMut,
    start: usize,
}

impl<'a> PayloadWriter<'a> {
    /// Creates a writer that appends to `buffer`.
    #[must_use]
    pub fn new(buffer: &'a mut BytesMut) -> Self {
        let start = buffer.len();
        Self { buffer, start }
    }

    /// Returns the number of bytes written through this writer.
    #[must_use]
    pub fn bytes_written(&self) -> usize {
        self.buffer.len() - self.start
    }

    /// Writes a u8.
    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    /// Writes a bool as a single 0/1 byte.
    pub fn write_bool(&mut self, value: bool) {
        self.buffer.put_u8(u8::from(value));
    }

    /// Writes an i32 in little-endian.
    pub fn write_i32(&mut self, value: i32) {
        self.buffer.put_i32_le(value);
    }

    /// Writes an i64 in little-endian.
    pub fn write_i64(&mut self, value: i64) {
        self.buffer.put_i64_le(value);
    }

    /// Writes an f64 in little-endian.
    pub fn write_f64(&mut self, value: f64) {
        self.buffer.put_f64_le(value);
    }

    /// Writes a string as a u16 byte length followed by its UTF-8 bytes.
    ///
    /// # Errors
    /// Returns `StringTooLong` if the string exceeds `u16::MAX` bytes.
    pub fn write_str(&mut self, value: &str) -> Result<()> {
        let len = u16::try_from(value.len()).map_err(|_| Error::StringTooLong { len: value.len() })?;
        self.buffer.put_u16_le(len);
        self.buffer.put_slice(value.as_bytes());
        Ok(())
    }

    /// Writes an optional value behind a presence marker.
    ///
    /// # Errors
    /// Propagates errors from `write_value`.
    pub fn write_optional<T, F>(&mut self, value: Option<&T>, write_value: F) -> Result<()>
    where
        T: ?Sized,
        F: FnOnce(&mut Self, &T) -> Result<()>,
    {
        match value {
            Some(v) => {
                self.write_u8(1);
                write_value(self, v)
            }
            None => {
                self.write_u8(0);
                Ok(())
            }
        }
    }

    /// Writes an optional string.
    ///
    /// # Errors
    /// Returns `StringTooLong` if the string exceeds `u16::MAX` bytes.
    pub fn write_optional_str(&mut self, value: Option<&str>) -> Result<()> {
        self.write_optional(value, |w, v| w.write_str(v))
    }

    /// Writes an optional f64.
    pub fn write_optional_f64(&mut self, value: Option<f64>) {
        match value {
            Some(v) => {
                self.write_u8(1);
                self.write_f64(v);
            }
            None => self.write_u8(0),
        }
    }
}
