//! Client builder.

use crate::client::MatchingEngineClient;
use crate::connection::{ConnectionConfig, ConnectionManager};
use crate::correlation::CorrelationTables;
use crate::error::ClientError;
use crate::reconnect::ReconnectConfig;
use crate::stats::ConnectionStats;
use mexlink_transport::TransportError;
use mexlink_transport::tcp::TcpClientConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Builder for configuring and creating a [`MatchingEngineClient`].
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    transport: TcpClientConfig,
    reconnect: ReconnectConfig,
    request_timeout: Option<Duration>,
    fail_pending_on_disconnect: bool,
    ping_interval: Option<Duration>,
}

impl ClientBuilder {
    /// Creates a new client builder for the specified engine address.
    #[must_use]
    pub fn new(server_addr: SocketAddr) -> Self {
        Self {
            transport: TcpClientConfig::new(server_addr),
            reconnect: ReconnectConfig::default(),
            request_timeout: None,
            fail_pending_on_disconnect: true,
            ping_interval: None,
        }
    }

    /// Creates a builder from a `host:port` string.
    ///
    /// # Errors
    /// Returns a transport `AddrParse` error if `addr` is not a socket
    /// address.
    pub fn parse(addr: &str) -> Result<Self, ClientError> {
        let addr: SocketAddr = addr.parse().map_err(TransportError::from)?;
        Ok(Self::new(addr))
    }

    /// Replaces the whole transport configuration.
    #[must_use]
    pub fn transport(mut self, config: TcpClientConfig) -> Self {
        self.transport = config;
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.transport.connect_timeout = timeout;
        self
    }

    /// Sets the maximum frame size in either direction. Larger requests fail
    /// with `FrameTooLarge` without touching the connection.
    #[must_use]
    pub fn max_frame_size(mut self, size: usize) -> Self {
        self.transport.max_frame_size = size;
        self
    }

    /// Sets the delay between reconnect attempts.
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect.delay = delay;
        self
    }

    /// Bounds how long a request waits for its response. Unbounded by
    /// default.
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Chooses whether pending requests fail with `ConnectionLost` when the
    /// connection drops, or stay pending. Enabled by default.
    #[must_use]
    pub fn fail_pending_on_disconnect(mut self, enabled: bool) -> Self {
        self.fail_pending_on_disconnect = enabled;
        self
    }

    /// Sends a keep-alive frame at this interval.
    #[must_use]
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = Some(interval);
        self
    }

    /// Builds the client. Call [`MatchingEngineClient::start`] to connect.
    #[must_use]
    pub fn build(self) -> MatchingEngineClient {
        let tables = Arc::new(CorrelationTables::new());
        let stats = Arc::new(ConnectionStats::new());
        let max_frame_size = self.transport.max_frame_size;
        let config = ConnectionConfig {
            transport: self.transport,
            reconnect: self.reconnect,
            ping_interval: self.ping_interval,
            fail_pending_on_disconnect: self.fail_pending_on_disconnect,
        };
        let manager = Arc::new(ConnectionManager::new(
            config,
            Arc::clone(&tables),
            Arc::clone(&stats),
        ));

        MatchingEngineClient::new(
            manager,
            tables,
            stats,
            self.request_timeout,
            max_frame_size,
        )
    }
}
