//! TCP client implementation.

use super::framing::FrameCodec;
use crate::error::TransportError;
use socket2::SockRef;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio_util::codec::FramedRead;

/// Read half of a split connection, yielding whole frames.
pub type FrameReader = FramedRead<OwnedReadHalf, FrameCodec>;

/// Configuration for TCP client.
#[derive(Debug, Clone)]
pub struct TcpClientConfig {
    /// Server address to connect to.
    pub server_addr: SocketAddr,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Maximum frame size in bytes.
    pub max_frame_size: usize,
    /// Enable TCP_NODELAY.
    pub tcp_nodelay: bool,
    /// Receive buffer size.
    pub recv_buffer_size: Option<usize>,
    /// Send buffer size.
    pub send_buffer_size: Option<usize>,
}

impl Default for TcpClientConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8888)))
    }
}

impl TcpClientConfig {
    /// Creates a new client config with the specified server address.
    #[must_use]
    pub fn new(server_addr: SocketAddr) -> Self {
        Self {
            server_addr,
            connect_timeout: Duration::from_secs(5),
            max_frame_size: 64 * 1024,
            tcp_nodelay: true,
            recv_buffer_size: Some(256 * 1024),
            send_buffer_size: Some(256 * 1024),
        }
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets the maximum frame size.
    #[must_use]
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.max_frame_size = size;
        self
    }

    /// Sets TCP_NODELAY option.
    #[must_use]
    pub fn tcp_nodelay(mut self, enabled: bool) -> Self {
        self.tcp_nodelay = enabled;
        self
    }

    /// Sets the socket receive and send buffer sizes. `None` keeps the OS
    /// default.
    #[must_use]
    pub fn buffer_sizes(mut self, recv: Option<usize>, send: Option<usize>) -> Self {
        self.recv_buffer_size = recv;
        self.send_buffer_size = send;
        self
    }
}

/// An established connection to the matching engine.
pub struct TcpClient {
    stream: TcpStream,
    peer_addr: SocketAddr,
    max_frame_size: usize,
}

impl TcpClient {
    /// Connects to a server with the given configuration.
    ///
    /// # Arguments
    /// * `config` - Client configuration
    ///
    /// # Errors
    /// Returns `TransportError` if connection fails or the socket cannot be
    /// configured.
    pub async fn connect(config: &TcpClientConfig) -> Result<Self, TransportError> {
        let stream = tokio::time::timeout(
            config.connect_timeout,
            TcpStream::connect(config.server_addr),
        )
        .await
        .map_err(|_| TransportError::ConnectTimeout)?
        .map_err(TransportError::Io)?;

        stream.set_nodelay(config.tcp_nodelay)?;
        let socket = SockRef::from(&stream);
        if let Some(size) = config.recv_buffer_size {
            socket.set_recv_buffer_size(size)?;
        }
        if let Some(size) = config.send_buffer_size {
            socket.set_send_buffer_size(size)?;
        }

        let peer_addr = stream.peer_addr()?;
        tracing::debug!(%peer_addr, "tcp connection established");

        Ok(Self {
            stream,
            peer_addr,
            max_frame_size: config.max_frame_size,
        })
    }

    /// Returns the peer address.
    #[must_use]
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Splits the connection into a frame reader and a raw write half.
    ///
    /// Writers are expected to hand complete, pre-encoded frames to the
    /// write half.
    #[must_use]
    pub fn into_split(self) -> (FrameReader, OwnedWriteHalf) {
        let (read, write) = self.stream.into_split();
        (
            FramedRead::new(read, FrameCodec::new(self.max_frame_size)),
            write,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tcp_client_config_default() {
        let config = TcpClientConfig::default();
        assert_eq!(config.server_addr.port(), 8888);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        assert_eq!(config.max_frame_size, 64 * 1024);
        assert!(config.tcp_nodelay);
        assert_eq!(config.recv_buffer_size, Some(256 * 1024));
        assert_eq!(config.send_buffer_size, Some(256 * 1024));
    }

    #[test]
    fn test_tcp_client_config_builder() {
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        let config = TcpClientConfig::new(addr)
            .connect_timeout(Duration::from_secs(10))
            .max_frame_size(128 * 1024)
            .tcp_nodelay(false)
            .buffer_sizes(None, Some(1024));

        assert_eq!(config.server_addr, addr);
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.max_frame_size, 128 * 1024);
        assert!(!config.tcp_nodelay);
        assert_eq!(config.recv_buffer_size, None);
        assert_eq!(config.send_buffer_size, Some(1024));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port with nothing listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let config = TcpClientConfig::new(addr).connect_timeout(Duration::from_secs(1));
        let result = TcpClient::connect(&config).await;
        assert!(matches!(
            result,
            Err(TransportError::Io(_) | TransportError::ConnectTimeout)
        ));
    }
}
