//! Lock-free connection counters.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Point-in-time copy of the connection counters.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SocketStatistics {
    /// Bytes written to the socket.
    pub bytes_sent: u64,
    /// Bytes read from the socket.
    pub bytes_received: u64,
    /// Frames written.
    pub frames_sent: u64,
    /// Frames read.
    pub frames_received: u64,
    /// Successful connections after the first one.
    pub reconnects: u64,
    /// Whether a session is currently live.
    pub connected: bool,
    /// Time of the last frame sent or received.
    pub last_activity: Option<SystemTime>,
    /// Time the current or most recent session was established.
    pub last_connected: Option<SystemTime>,
}

/// Counters shared by the connection manager and every session.
///
/// Timestamps are stored as nanoseconds since the Unix epoch, with zero
/// meaning "never".
#[derive(Debug, Default)]
pub struct ConnectionStats {
    bytes_sent: AtomicU64,
    bytes_received: AtomicU64,
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
    reconnects: AtomicU64,
    connected: AtomicBool,
    last_activity: AtomicU64,
    last_connected: AtomicU64,
}

impl ConnectionStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one frame written.
    pub fn record_sent(&self, bytes: usize) {
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
        self.last_activity.store(now_nanos(), Ordering::Relaxed);
    }

    /// Records one frame read.
    pub fn record_received(&self, bytes: usize) {
        self.bytes_received.fetch_add(bytes as u64, Ordering::Relaxed);
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.last_activity.store(now_nanos(), Ordering::Relaxed);
    }

    /// Marks a session as established.
    pub fn record_connected(&self) {
        let previous = self.last_connected.swap(now_nanos(), Ordering::Relaxed);
        if previous != 0 {
            self.reconnects.fetch_add(1, Ordering::Relaxed);
        }
        self.connected.store(true, Ordering::Release);
    }

    /// Marks the current session as gone.
    pub fn record_disconnected(&self) {
        self.connected.store(false, Ordering::Release);
    }

    /// Returns whether a session is live.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Returns a snapshot of every counter.
    #[must_use]
    pub fn snapshot(&self) -> SocketStatistics {
        SocketStatistics {
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            connected: self.is_connected(),
            last_activity: from_nanos(self.last_activity.load(Ordering::Relaxed)),
            last_connected: from_nanos(self.last_connected.load(Ordering::Relaxed)),
        }
    }
}

fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

fn from_nanos(nanos: u64) -> Option<SystemTime> {
    (nanos != 0).then(|| UNIX_EPOCH + Duration::from_nanos(nanos))
}
