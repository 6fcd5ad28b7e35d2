//! Payload decoding.
//!
//! This module provides the [`PayloadDecoder`] trait implemented by every
//! message in the catalogue, and the bounds-checked [`PayloadReader`] cursor.

use crate::error::{Error, Result};
use crate::types::MessageType;

/// Trait for messages that can be parsed from a frame payload.
pub trait PayloadDecoder: Sized {
    /// Type tag this decoder accepts.
    const MESSAGE_TYPE: MessageType;

    /// Reads the payload fields in wire order.
    ///
    /// # Errors
    /// Returns an error if the payload is truncated or a field is invalid.
    fn decode_payload(reader: &mut PayloadReader<'_>) -> Result<Self>;

    /// Decodes a complete payload, rejecting trailing bytes.
    ///
    /// # Errors
    /// Returns an error if the payload is malformed or not fully consumed.
    fn decode(payload: &[u8]) -> Result<Self> {
        let mut reader = PayloadReader::new(payload);
        let value = Self::decode_payload(&mut reader)?;
        reader.finish()?;
        Ok(value)
    }
}

/// Sequential little-endian reader over a payload slice.
#[derive(Debug, Clone)]
pub struct PayloadReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> PayloadReader<'a> {
    /// Wraps a payload slice.
    #[must_use]
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    /// Returns the current read position.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Fails if any bytes are left unread.
    ///
    /// # Errors
    /// Returns `TrailingBytes` if the payload was not fully consumed.
    pub fn finish(&self) -> Result<()> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(Error::TrailingBytes { remaining }),
        }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let required = self.position + count;
        if required > self.buffer.len() {
            return Err(Error::BufferTooShort {
                required,
                available: self.buffer.len(),
            });
        }
        let bytes = &self.buffer[self.position..required];
        self.position = required;
        Ok(bytes)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Reads a u8.
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    /// Reads a u16 in little-endian.
    pub fn read_u16(&mut self) -> Result<u16> {
        self.take_array().map(u16::from_le_bytes)
    }

    /// Reads an i32 in little-endian.
    pub fn read_i32(&mut self) -> Result<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    /// Reads an i64 in little-endian.
    pub fn read_i64(&mut self) -> Result<i64> {
        self.take_array().map(i64::from_le_bytes)
    }

    /// Reads an f64 in little-endian.
    pub fn read_f64(&mut self) -> Result<f64> {
        self.take_array().map(f64::from_le_bytes)
    }

    /// Reads a bool, rejecting anything other than 0 or 1.
    pub fn read_bool(&mut self, field: &'static str) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(Error::InvalidEnumValue {
                field,
                value: i64::from(value),
            }),
        }
    }

    /// Reads a u16-length-prefixed UTF-8 string.
    pub fn read_string(&mut self) -> Result<String> {
        let len = usize::from(self.read_u16()?);
        let offset = self.position;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| Error::InvalidUtf8 { offset })
    }

    /// Reads a presence marker and, when set, the value behind it.
    pub fn read_optional<T, F>(&mut self, read_value: F) -> Result<Option<T>>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let offset = self.position;
        match self.read_u8()? {
            0 => Ok(None),
            1 => read_value(self).map(Some),
            value => Err(Error::InvalidPresenceMarker { offset, value }),
        }
    }

    /// Reads an optional string.
    pub fn read_optional_string(&mut self) -> Result<Option<String>> {
        self.read_optional(Self::read_string)
    }

    /// Reads an optional f64.
    pub fn read_optional_f64(&mut self) -> Result<Option<f64>> {
        self.read_optional(Self::read_f64)
    }
}
