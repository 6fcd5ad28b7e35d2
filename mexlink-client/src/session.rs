//! Client session bound to one live connection.
//!
//! A session owns a writer task, the single serialization point for outbound
//! frames, and runs the read loop that decodes inbound frames and routes them
//! to the correlation tables. Callers hand whole frames to the writer through
//! a queue and wait for an acknowledgement, so a caller that gives up never
//! leaves half a frame on the wire. A session is never reused: a reconnect
//! builds a fresh one.

use crate::correlation::{CorrelationTables, Routed};
use crate::error::ClientError;
use crate::stats::ConnectionStats;
use bytes::Bytes;
use futures::StreamExt;
use mexlink_core::{Message, Ping};
use mexlink_transport::TransportError;
use mexlink_transport::tcp::FrameReader;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, Interval};
use tokio_util::sync::CancellationToken;

/// Frames queued for the writer task before senders have to wait.
pub const WRITE_QUEUE_CAPACITY: usize = 1024;

type WriteAck = oneshot::Sender<Result<(), ClientError>>;

struct Outbound {
    frame: Bytes,
    ack: Option<WriteAck>,
}

/// One live connection's write path and read loop.
pub struct Session {
    id: u64,
    queue: mpsc::Sender<Outbound>,
    writer: parking_lot::Mutex<Option<JoinHandle<()>>>,
    stats: Arc<ConnectionStats>,
    closed: CancellationToken,
}

impl Session {
    /// Creates a session around the write half of a fresh connection and
    /// spawns its writer task on the current runtime.
    ///
    /// Cancelling `closed` (directly or through a parent token) ends the read
    /// loop and the writer, and refuses further sends.
    #[must_use]
    pub fn new(
        id: u64,
        writer: OwnedWriteHalf,
        stats: Arc<ConnectionStats>,
        closed: CancellationToken,
    ) -> Self {
        let (queue, rx) = mpsc::channel(WRITE_QUEUE_CAPACITY);
        let task = tokio::spawn(write_loop(
            id,
            writer,
            rx,
            Arc::clone(&stats),
            closed.clone(),
        ));
        Self {
            id,
            queue,
            writer: parking_lot::Mutex::new(Some(task)),
            stats,
            closed,
        }
    }

    /// Returns the session id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns true once the session has ended.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Ends the session. Idempotent.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Queues one complete, pre-encoded frame and waits until the writer has
    /// put all of it on the socket.
    ///
    /// Dropping the returned future does not withdraw a frame that was
    /// already queued: the writer still writes it whole.
    ///
    /// # Errors
    /// Returns `NotConnected` if the session has ended before the frame was
    /// written, or `SendFailed` if the write fails. A write error closes the
    /// session.
    pub async fn send(&self, frame: Bytes) -> Result<(), ClientError> {
        if self.is_closed() {
            return Err(ClientError::NotConnected);
        }
        let (ack, written) = oneshot::channel();
        self.queue
            .send(Outbound {
                frame,
                ack: Some(ack),
            })
            .await
            .map_err(|_| ClientError::NotConnected)?;
        written.await.unwrap_or(Err(ClientError::NotConnected))
    }

    /// Closes the session and waits for the writer task to finish with the
    /// socket. Frames still queued are answered with `NotConnected`.
    pub async fn shutdown(&self) {
        self.close();
        let task = self.writer.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::error!(session = self.id, error = %e, "writer task panicked");
            }
        }
    }

    /// Runs the read loop until the session is closed or the connection
    /// fails.
    ///
    /// When `ping_interval` is set, a keep-alive frame is queued every
    /// interval without waiting for the write, so a slow socket never stalls
    /// reading.
    ///
    /// # Errors
    /// Returns the read or decode error that ended the session. A remote
    /// close is reported as `ConnectionClosed`. A local close, including one
    /// caused by a failed write, returns `Ok(())`.
    pub async fn run(
        &self,
        reader: &mut FrameReader,
        tables: &CorrelationTables,
        ping_interval: Option<Duration>,
    ) -> Result<(), ClientError> {
        let ping = Message::from(Ping).to_bytes()?;
        let mut ticker =
            ping_interval.map(|period| tokio::time::interval_at(Instant::now() + period, period));

        loop {
            tokio::select! {
                () = self.closed.cancelled() => return Ok(()),

                _ = next_tick(&mut ticker) => {
                    let queued = self.queue.try_send(Outbound {
                        frame: ping.clone(),
                        ack: None,
                    });
                    match queued {
                        Ok(()) => tracing::trace!(session = self.id, "keep-alive queued"),
                        Err(mpsc::error::TrySendError::Full(_)) => {
                            tracing::debug!(session = self.id, "write queue full, skipping keep-alive");
                        }
                        // The writer is gone; the close branch ends the loop.
                        Err(mpsc::error::TrySendError::Closed(_)) => {}
                    }
                }

                frame = reader.next() => {
                    let frame = match frame {
                        Some(Ok(frame)) => frame,
                        Some(Err(e)) => return Err(e.into()),
                        None => return Err(TransportError::ConnectionClosed.into()),
                    };
                    self.stats.record_received(frame.wire_len());

                    let message = frame.decode()?;
                    self.dispatch(message, tables);
                }
            }
        }
    }

    fn dispatch(&self, message: Message, tables: &CorrelationTables) {
        let key = message.correlation_key();
        match tables.route(message) {
            Routed::Delivered => {
                if let Some(key) = key {
                    tracing::trace!(session = self.id, %key, "response delivered");
                }
            }
            Routed::Unmatched => {
                if let Some(key) = key {
                    tracing::debug!(session = self.id, %key, "no pending request for response, ignoring");
                }
            }
            Routed::KeepAlive => {}
            Routed::Unexpected(kind) => {
                tracing::warn!(session = self.id, ?kind, "engine sent a request-kind message, dropping");
            }
        }
    }
}

/// Writes queued frames one at a time until the session closes.
///
/// A write interrupted by close is abandoned, which is harmless because the
/// connection is being torn down. Nothing else interrupts a write.
async fn write_loop(
    id: u64,
    mut writer: OwnedWriteHalf,
    mut queue: mpsc::Receiver<Outbound>,
    stats: Arc<ConnectionStats>,
    closed: CancellationToken,
) {
    loop {
        let outbound = tokio::select! {
            biased;
            () = closed.cancelled() => break,
            outbound = queue.recv() => match outbound {
                Some(outbound) => outbound,
                None => break,
            },
        };

        let written = tokio::select! {
            biased;
            () = closed.cancelled() => break,
            written = writer.write_all(&outbound.frame) => written,
        };

        match written {
            Ok(()) => {
                stats.record_sent(outbound.frame.len());
                if let Some(ack) = outbound.ack {
                    let _ = ack.send(Ok(()));
                }
            }
            Err(e) => {
                tracing::warn!(session = id, error = %e, "write failed, closing session");
                closed.cancel();
                if let Some(ack) = outbound.ack {
                    let _ = ack.send(Err(ClientError::SendFailed(e)));
                }
                break;
            }
        }
    }

    // Dropping the receiver drops every queued ack, which senders see as
    // NotConnected.
    drop(queue);
    if let Err(e) = writer.shutdown().await {
        tracing::debug!(session = id, error = %e, "write half shutdown failed");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => std::future::pending().await,
    }
}
