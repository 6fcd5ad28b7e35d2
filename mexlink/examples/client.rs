//! Example client issuing a few requests of every kind.
//!
//! Run with: `RUST_LOG=info cargo run --example client [engine-addr]`
//!
//! Start the engine first: `cargo run --example demo_engine`

use mexlink::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:8888".to_string());

    let client = ClientBuilder::parse(&addr)?
        .reconnect_delay(Duration::from_secs(1))
        .request_timeout(Duration::from_secs(5))
        .ping_interval(Duration::from_secs(10))
        .build();
    client.start();

    while !client.is_connected() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    tracing::info!(%addr, "connected");

    let response = client.cash_in_out("cash-1", "client1", "USD", 100.0).await?;
    tracing::info!(status = ?response.status, amount = ?response.amount, "cash in");

    let response = client
        .transfer("transfer-1", "client1", "client2", "USD", 25.0, 0.0, None)
        .await?;
    tracing::info!(status = ?response.status, "transfer");

    let order = LimitOrder::new("order-1", "client1", "BTCUSD", 0.5, 20_000.0)
        .with_fee(Fee::client("fee-wallet", 0.1, FeeSizeType::Percentage));
    let response = client.place_limit_order(order).await?;
    tracing::info!(status = ?response.status, "limit order placed");

    let response = client.cancel_limit_order("order-1").await?;
    tracing::info!(status = ?response.status, "limit order cancelled");

    let fill = client
        .handle_market_order(MarketOrder::new("market-1", "client1", "BTCUSD", 0.1, true))
        .await?;
    tracing::info!(status = ?fill.status, price = ?fill.price, "market order");

    let record = client
        .handle_market_order_legacy("client1", "BTCUSD", OrderAction::Sell, 0.1, true, None)
        .await?;
    tracing::info!(?record, "legacy market order");

    let stats = client.socket_statistics();
    tracing::info!(
        frames_sent = stats.frames_sent,
        frames_received = stats.frames_received,
        bytes_sent = stats.bytes_sent,
        bytes_received = stats.bytes_received,
        reconnects = stats.reconnects,
        "statistics"
    );

    client.shutdown().await;
    Ok(())
}
