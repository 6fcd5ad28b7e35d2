//! Connection supervision.
//!
//! The [`ConnectionManager`] runs one background task that connects, hands
//! the connection to a fresh [`Session`] until it dies, waits the reconnect
//! delay and tries again, for as long as the client lives.

use crate::correlation::CorrelationTables;
use crate::error::ClientError;
use crate::reconnect::{ReconnectConfig, ReconnectState};
use crate::session::Session;
use crate::stats::ConnectionStats;
use mexlink_transport::tcp::{TcpClient, TcpClientConfig};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Settings for the connection supervisor.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Socket and framing settings.
    pub transport: TcpClientConfig,
    /// Reconnect policy.
    pub reconnect: ReconnectConfig,
    /// Keep-alive interval, if any.
    pub ping_interval: Option<Duration>,
    /// Fail every pending request as soon as a session ends.
    pub fail_pending_on_disconnect: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            transport: TcpClientConfig::default(),
            reconnect: ReconnectConfig::default(),
            ping_interval: None,
            fail_pending_on_disconnect: true,
        }
    }
}

/// Owns the connection lifecycle and the current session.
pub struct ConnectionManager {
    config: ConnectionConfig,
    tables: Arc<CorrelationTables>,
    stats: Arc<ConnectionStats>,
    current: RwLock<Option<Arc<Session>>>,
    next_session_id: AtomicU64,
    shutdown: CancellationToken,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Creates a manager. Nothing connects until [`start`](Self::start).
    #[must_use]
    pub fn new(
        config: ConnectionConfig,
        tables: Arc<CorrelationTables>,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        Self {
            config,
            tables,
            stats,
            current: RwLock::new(None),
            next_session_id: AtomicU64::new(1),
            shutdown: CancellationToken::new(),
            supervisor: Mutex::new(None),
        }
    }

    /// Spawns the supervisory loop on the current tokio runtime.
    ///
    /// Calling it again while the loop is running, or after shutdown, does
    /// nothing.
    pub fn start(self: &Arc<Self>) {
        let mut supervisor = self.supervisor.lock();
        if supervisor.is_some() || self.shutdown.is_cancelled() {
            return;
        }
        let manager = Arc::clone(self);
        *supervisor = Some(tokio::spawn(manager.supervise()));
    }

    /// Returns the live session, if any.
    #[must_use]
    pub fn current_session(&self) -> Option<Arc<Session>> {
        self.current
            .read()
            .as_ref()
            .filter(|session| !session.is_closed())
            .cloned()
    }

    /// Returns whether a session is live.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.stats.is_connected()
    }

    /// Returns true once shutdown has been requested.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Stops the supervisory loop and closes the current session. Every
    /// pending request fails with `Shutdown`.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let mut failed = self.tables.fail_all(|| ClientError::Shutdown);

        let handle = self.supervisor.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "connection supervisor panicked");
            }
        }

        // A request that raced the cancellation may have registered after
        // the first sweep; the writer is drained by now.
        failed += self.tables.fail_all(|| ClientError::Shutdown);
        if failed > 0 {
            tracing::info!(failed, "failed pending requests on shutdown");
        }
    }

    async fn supervise(self: Arc<Self>) {
        let addr = self.config.transport.server_addr;
        let mut reconnect = ReconnectState::new(self.config.reconnect.clone());
        tracing::info!(%addr, "connection manager started");

        loop {
            let connected = tokio::select! {
                () = self.shutdown.cancelled() => break,
                result = TcpClient::connect(&self.config.transport) => result,
            };

            match connected {
                Ok(client) => {
                    reconnect.on_success();
                    self.run_session(client).await;
                }
                Err(e) => {
                    tracing::warn!(%addr, error = %e, "connect failed");
                }
            }

            if self.shutdown.is_cancelled() {
                break;
            }
            let delay = reconnect.on_failure();
            tracing::info!(%addr, ?delay, attempt = reconnect.attempts(), "reconnecting");

            tokio::select! {
                () = self.shutdown.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }

        self.stats.record_disconnected();
        tracing::info!(%addr, "connection manager stopped");
    }

    async fn run_session(&self, client: TcpClient) {
        let id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let peer = client.peer_addr();
        let (mut reader, writer) = client.into_split();

        let session = Arc::new(Session::new(
            id,
            writer,
            Arc::clone(&self.stats),
            self.shutdown.child_token(),
        ));
        *self.current.write() = Some(Arc::clone(&session));
        self.stats.record_connected();
        tracing::info!(session = id, %peer, "connected");

        let result = session
            .run(&mut reader, &self.tables, self.config.ping_interval)
            .await;

        // Close, then wait for the writer task to finish, then sweep: any
        // request whose frame reached the wire is registered before the
        // sweep runs.
        session.shutdown().await;
        {
            let mut current = self.current.write();
            if current.as_ref().is_some_and(|s| s.id() == id) {
                *current = None;
            }
        }
        self.stats.record_disconnected();

        match result {
            Ok(()) => tracing::info!(session = id, "session closed"),
            Err(e) => tracing::error!(session = id, error = %e, "session ended"),
        }

        if self.config.fail_pending_on_disconnect {
            let oldest = self.tables.oldest_age();
            let failed = self.tables.fail_all(|| ClientError::ConnectionLost);
            if failed > 0 {
                tracing::warn!(session = id, failed, ?oldest, "failed pending requests on disconnect");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mexlink_transport::tcp::{TcpServer, TcpServerConfig};

    fn manager_for(addr: std::net::SocketAddr, delay: Duration) -> Arc<ConnectionManager> {
        let config = ConnectionConfig {
            transport: TcpClientConfig::new(addr),
            reconnect: ReconnectConfig { delay },
            ..ConnectionConfig::default()
        };
        Arc::new(ConnectionManager::new(
            config,
            Arc::new(CorrelationTables::new()),
            Arc::new(ConnectionStats::new()),
        ))
    }

    async fn wait_for(condition: impl Fn() -> bool) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while !condition() {
            assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[test]
    fn test_connection_config_default() {
        let config = ConnectionConfig::default();
        assert_eq!(config.reconnect.delay, Duration::from_secs(3));
        assert!(config.ping_interval.is_none());
        assert!(config.fail_pending_on_disconnect);
    }

    #[tokio::test]
    async fn test_no_session_before_start() {
        let manager = manager_for("127.0.0.1:9".parse().unwrap(), Duration::from_millis(10));
        assert!(manager.current_session().is_none());
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_connects_and_reconnects() {
        let server = TcpServer::bind(TcpServerConfig::default()).await.unwrap();
        let manager = manager_for(server.local_addr().unwrap(), Duration::from_millis(20));
        manager.start();

        let first = server.accept().await.unwrap();
        wait_for(|| manager.is_connected()).await;
        let first_id = manager.current_session().unwrap().id();

        drop(first);
        let _second = server.accept().await.unwrap();
        wait_for(|| manager.stats.snapshot().reconnects == 1).await;

        let second_id = manager.current_session().unwrap().id();
        assert_ne!(first_id, second_id);
        manager.shutdown().await;
        assert!(!manager.is_connected());
        assert!(manager.is_shut_down());
    }

    #[tokio::test]
    async fn test_shutdown_while_unreachable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let manager = manager_for(addr, Duration::from_secs(60));
        manager.start();
        tokio::time::sleep(Duration::from_millis(50)).await;

        // Must not wait out the reconnect delay.
        tokio::time::timeout(Duration::from_secs(2), manager.shutdown())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_disconnect_sweep_fails_pending() {
        let server = TcpServer::bind(TcpServerConfig::default()).await.unwrap();
        let manager = manager_for(server.local_addr().unwrap(), Duration::from_millis(20));
        manager.start();

        let conn = server.accept().await.unwrap();
        wait_for(|| manager.is_connected()).await;
        let pending = manager.tables.generic.register("k".to_string()).unwrap();

        drop(conn);
        assert!(matches!(pending.await, Err(ClientError::ConnectionLost)));
        manager.shutdown().await;
    }
}
