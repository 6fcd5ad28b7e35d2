//! TCP server implementation.
//!
//! The client runtime never listens; this side exists for engine simulators
//! and end-to-end tests that need to play the remote role.

use super::framing::FrameCodec;
use crate::error::TransportError;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use mexlink_core::{Frame, Message};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::Framed;

/// Configuration for TCP server.
#[derive(Debug, Clone)]
pub struct TcpServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Maximum frame size in bytes.
    pub max_frame_size: usize,
    /// Enable TCP_NODELAY.
    pub tcp_nodelay: bool,
}

impl Default for TcpServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 0)))
    }
}

impl TcpServerConfig {
    /// Creates a new server config with the specified bind address.
    #[must_use]
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            max_frame_size: 64 * 1024,
            tcp_nodelay: true,
        }
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }
}

/// TCP listener speaking the frame protocol.
pub struct TcpServer {
    listener: TcpListener,
    config: Arc<TcpServerConfig>,
}

impl TcpServer {
    /// Binds to the configured address.
    ///
    /// # Errors
    /// Returns IO error if binding fails.
    pub async fn bind(config: TcpServerConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        Ok(Self {
            listener,
            config: Arc::new(config),
        })
    }

    /// Accepts a new connection.
    ///
    /// # Errors
    /// Returns IO error if accept fails.
    pub async fn accept(&self) -> std::io::Result<TcpConnection> {
        let (stream, addr) = self.listener.accept().await?;
        stream.set_nodelay(self.config.tcp_nodelay)?;

        Ok(TcpConnection {
            framed: Framed::new(stream, FrameCodec::new(self.config.max_frame_size)),
            peer_addr: addr,
        })
    }

    /// Returns the local address the server is bound to.
    ///
    /// # Errors
    /// Returns IO error if the socket address cannot be read.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// One accepted connection.
pub struct TcpConnection {
    framed: Framed<TcpStream, FrameCodec>,
    peer_addr: SocketAddr,
}

impl TcpConnection {
    /// Returns the peer address.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Sends a message.
    ///
    /// # Errors
    /// Returns `TransportError` if encoding or the write fails.
    pub async fn send(&mut self, message: &Message) -> Result<(), TransportError> {
        self.framed.send(message).await
    }

    /// Sends an already-encoded frame.
    ///
    /// # Errors
    /// Returns `TransportError` if the bytes are not one whole frame or the
    /// write fails.
    pub async fn send_raw(&mut self, frame: Bytes) -> Result<(), TransportError> {
        self.framed.send(frame).await
    }

    /// Receives the next raw frame.
    ///
    /// # Returns
    /// `Some(Ok(frame))` if a frame was received, `None` if connection closed.
    pub async fn recv_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        self.framed.next().await
    }

    /// Receives and decodes the next message.
    ///
    /// # Returns
    /// `Some(Ok(message))` if a message was received, `None` if connection
    /// closed.
    pub async fn recv(&mut self) -> Option<Result<Message, TransportError>> {
        let frame = self.framed.next().await?;
        Some(frame.and_then(|f| f.decode().map_err(TransportError::from)))
    }

    /// Closes the connection.
    ///
    /// # Errors
    /// Returns `TransportError` if flushing or shutdown fails.
    pub async fn close(mut self) -> Result<(), TransportError> {
        SinkExt::<Bytes>::close(&mut self.framed).await
    }
}
