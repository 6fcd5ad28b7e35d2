//! Error types for client operations.

use thiserror::Error;

/// Error type for client operations.
///
/// Non-OK engine status codes are not errors; they come back as data in the
/// response types.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] mexlink_transport::TransportError),

    /// A message could not be encoded or an inbound frame could not be
    /// decoded.
    #[error("codec error: {0}")]
    Codec(#[from] mexlink_core::Error),

    /// No live session to send through.
    #[error("not connected")]
    NotConnected,

    /// The write to the socket failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// The correlation key already has a live pending request.
    #[error("duplicate correlation key: {key}")]
    DuplicateKey {
        /// The rejected key.
        key: String,
    },

    /// The pending request was cancelled before a response arrived.
    #[error("request cancelled")]
    Cancelled,

    /// No response arrived within the configured request timeout.
    #[error("request timed out")]
    Timeout,

    /// The connection dropped while the request was pending.
    #[error("connection lost")]
    ConnectionLost,

    /// The client was shut down.
    #[error("client shut down")]
    Shutdown,
}
