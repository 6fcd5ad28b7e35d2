//! Minimal stand-in for the matching engine.
//!
//! Accepts any number of clients and answers every request with an OK
//! status. Cash and balance operations echo their amount; market orders
//! fill at a fixed price.
//!
//! Run with: `RUST_LOG=info cargo run --example demo_engine [bind-addr]`

use mexlink::prelude::*;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

const FILL_PRICE: f64 = 100.0;

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
        Message::LimitOrder(m) => NewResponse::ok(m.id.clone()).into(),
        Message::LimitOrderCancel(m) => NewResponse::ok(m.id.clone()).into(),
        Message::MarketOrder(m) => MarketOrderResponse {
            id: m.id.clone(),
            status: StatusCode::Ok,
            status_reason: None,
            price: Some(FILL_PRICE),
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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let addr: SocketAddr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8888".to_string())
        .parse()?;

    let server = TcpServer::bind(TcpServerConfig::new(addr)).await?;
    tracing::info!(addr = %server.local_addr()?, "demo engine listening");

    let handled = Arc::new(AtomicU64::new(0));

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(handled = handled.load(Ordering::Relaxed), "shutting down");
                return Ok(());
            }
            accepted = server.accept() => {
                let mut conn = accepted?;
                let handled = Arc::clone(&handled);
                tokio::spawn(async move {
                    let peer = conn.peer_addr();
                    tracing::info!(%peer, "client connected");

                    while let Some(received) = conn.recv().await {
                        let request = match received {
                            Ok(request) => request,
                            Err(e) => {
                                tracing::warn!(%peer, error = %e, "bad frame, dropping client");
                                break;
                            }
                        };
                        let count = handled.fetch_add(1, Ordering::Relaxed) + 1;
                        tracing::debug!(%peer, count, kind = ?request.message_type(), "request");

                        if let Some(response) = answer(&request) {
                            if let Err(e) = conn.send(&response).await {
                                tracing::warn!(%peer, error = %e, "send failed");
                                break;
                            }
                        }
                    }
                    tracing::info!(%peer, "client disconnected");
                });
            }
        }
    }
}
