//! In-process stand-in for the matching engine.

use bytes::Bytes;
use mexlink_core::{
    LegacyResponse, MarketOrderResponse, Message, NewResponse, StatusCode,
};
use mexlink_transport::tcp::{TcpConnection, TcpServer, TcpServerConfig};
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How the engine reacts to requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Answer every request.
    Answer,
    /// Record requests, never answer.
    Silent,
    /// Answer a frame with an unknown tag to the first request, then answer
    /// normally.
    GarbageOnce,
    /// Send unmatched responses in every namespace before each answer.
    StrayFirst,
}

struct Shared {
    behavior: Behavior,
    received: Mutex<Vec<Message>>,
    connections: AtomicUsize,
    garbage_sent: AtomicBool,
    kill: watch::Sender<u64>,
    reading: watch::Sender<bool>,
}

/// A fake engine listening on an ephemeral local port.
pub struct FakeEngine {
    addr: SocketAddr,
    shared: Arc<Shared>,
    accept: JoinHandle<()>,
}

impl FakeEngine {
    pub async fn start(behavior: Behavior) -> Self {
        Self::spawn(behavior, true).await
    }

    /// Starts an engine that accepts connections but reads nothing until
    /// [`resume_reads`](Self::resume_reads).
    pub async fn start_paused(behavior: Behavior) -> Self {
        Self::spawn(behavior, false).await
    }

    async fn spawn(behavior: Behavior, reading: bool) -> Self {
        let server = TcpServer::bind(TcpServerConfig::default()).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (kill, _) = watch::channel(0);
        let (reading, _) = watch::channel(reading);
        let shared = Arc::new(Shared {
            behavior,
            received: Mutex::new(Vec::new()),
            connections: AtomicUsize::new(0),
            garbage_sent: AtomicBool::new(false),
            kill,
            reading,
        });

        let accept_shared = Arc::clone(&shared);
        let accept = tokio::spawn(async move {
            while let Ok(conn) = server.accept().await {
                accept_shared.connections.fetch_add(1, Ordering::SeqCst);
                let kill = accept_shared.kill.subscribe();
                tokio::spawn(serve(conn, Arc::clone(&accept_shared), kill));
            }
        });

        Self {
            addr,
            shared,
            accept,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Closes every connection accepted so far. New connections are served.
    pub fn drop_connections(&self) {
        self.shared.kill.send_modify(|generation| *generation += 1);
    }

    /// Lets every connection start reading requests.
    pub fn resume_reads(&self) {
        self.shared.reading.send_replace(true);
    }

    /// Number of connections accepted.
    pub fn connections(&self) -> usize {
        self.shared.connections.load(Ordering::SeqCst)
    }

    /// Every message received so far, in arrival order.
    pub fn received(&self) -> Vec<Message> {
        self.shared.received.lock().clone()
    }
}

impl Drop for FakeEngine {
    fn drop(&mut self) {
        self.accept.abort();
        self.drop_connections();
    }
}

async fn serve(mut conn: TcpConnection, shared: Arc<Shared>, mut kill: watch::Receiver<u64>) {
    let mut reading = shared.reading.subscribe();
    tokio::select! {
        _ = kill.changed() => return,
        opened = reading.wait_for(|open| *open) => {
            if opened.is_err() {
                return;
            }
        }
    }

    loop {
        let request = tokio::select! {
            _ = kill.changed() => return,
            request = conn.recv() => request,
        };
        let Some(Ok(request)) = request else {
            return;
        };
        shared.received.lock().push(request.clone());

        match shared.behavior {
            Behavior::Silent => continue,
            Behavior::GarbageOnce if !shared.garbage_sent.swap(true, Ordering::SeqCst) => {
                let _ = conn.send_raw(Bytes::from_static(&[1, 0, 0, 0, 250])).await;
                continue;
            }
            Behavior::StrayFirst => {
                for stray in strays() {
                    if conn.send(&stray).await.is_err() {
                        return;
                    }
                }
            }
            _ => {}
        }

        if let Some(response) = answer(&request) {
            if conn.send(&response).await.is_err() {
                return;
            }
        }
    }
}

fn strays() -> Vec<Message> {
    vec![
        NewResponse::ok("never-registered").into(),
        LegacyResponse {
            process_id: -1,
            record_id: None,
        }
        .into(),
        MarketOrderResponse {
            id: "never-registered".into(),
            status: StatusCode::Ok,
            status_reason: None,
            price: None,
        }
        .into(),
    ]
}

fn answer(request: &Message) -> Option<Message> {
    let response: Message = match request {
        Message::CashInOut(m) => NewResponse {
            amount: Some(m.amount),
            ..NewResponse::ok(m.id.clone())
        }
        .into(),
        Message::BalanceUpdate(m) => NewResponse {
            amount: Some(m.amount),
            ..NewResponse::ok(m.id.clone())
        }
        .into(),
        Message::Transfer(m) => NewResponse::ok(m.id.clone()).into(),
        Message::Swap(m) => NewResponse::ok(m.id.clone()).into(),
        Message::LimitOrderCancel(m) => NewResponse::ok(m.id.clone()).into(),
        Message::LimitOrder(m) if m.volume == 0.0 => NewResponse {
            status: StatusCode::TooSmallVolume,
            status_reason: Some("volume is zero".into()),
            ..NewResponse::ok(m.id.clone())
        }
        .into(),
        Message::LimitOrder(m) => NewResponse::ok(m.id.clone()).into(),
        Message::MarketOrder(m) => MarketOrderResponse {
            id: m.id.clone(),
            status: StatusCode::Ok,
            status_reason: None,
            price: Some(100.0),
        }
        .into(),
        Message::LegacyMarketOrder(m) => LegacyResponse {
            process_id: m.id,
            record_id: Some(format!("record-{}", m.id)),
        }
        .into(),
        _ => return None,
    };
    Some(response)
}
