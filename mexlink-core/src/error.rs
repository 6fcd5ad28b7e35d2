//! Error types for mexlink core operations.

use thiserror::Error;

/// Core error type for frame and payload encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Buffer is too short for the requested read.
    #[error("buffer too short: required {required} bytes, available {available} bytes")]
    BufferTooShort {
        /// Required buffer size in bytes.
        required: usize,
        /// Available buffer size in bytes.
        available: usize,
    },

    /// Frame carries a type tag outside the message catalogue.
    #[error("unknown message type tag {tag}")]
    UnknownMessageType {
        /// Tag byte found on the wire.
        tag: u8,
    },

    /// Frame length prefix does not even cover the type tag.
    #[error("empty frame: length prefix must cover the type tag")]
    EmptyFrame,

    /// Invalid enum value encountered.
    #[error("invalid value {value} for field {field}")]
    InvalidEnumValue {
        /// Field name.
        field: &'static str,
        /// Invalid value encountered.
        value: i64,
    },

    /// Invalid UTF-8 encoding in string field.
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 {
        /// Byte offset where the string starts.
        offset: usize,
    },

    /// Optional-field marker is neither 0 nor 1.
    #[error("invalid presence marker {value} at offset {offset}")]
    InvalidPresenceMarker {
        /// Byte offset of the marker.
        offset: usize,
        /// Marker value.
        value: u8,
    },

    /// String does not fit the u16 length prefix.
    #[error("string too long: {len} bytes")]
    StringTooLong {
        /// Length in bytes.
        len: usize,
    },

    /// Payload does not fit the u32 length prefix.
    #[error("frame too large: {size} payload bytes")]
    FrameTooLarge {
        /// Payload size in bytes.
        size: usize,
    },

    /// Payload has bytes left after the last field.
    #[error("{remaining} trailing bytes after payload")]
    TrailingBytes {
        /// Unread byte count.
        remaining: usize,
    },
}

/// Result type alias for mexlink core operations.
pub type Result<T> = std::result::Result<T, Error>;
