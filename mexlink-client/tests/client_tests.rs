//! End-to-end tests for the client against an in-process engine.

mod support;

use mexlink_client::ClientError;
use mexlink_core::{LimitOrder, MarketOrder, Message, OrderAction, StatusCode};
use mexlink_transport::TransportError;
use mexlink_transport::tcp::TcpClientConfig;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use support::engine::{Behavior, FakeEngine};
use support::{client_for, dead_addr, eventually};

#[tokio::test]
async fn test_cash_in_out_round_trip() {
    let engine = FakeEngine::start(Behavior::Answer).await;
    let client = client_for(engine.addr()).build();
    client.start();
    eventually("connection", || client.is_connected()).await;

    let response = client
        .cash_in_out("id1", "client1", "USD", 100.0)
        .await
        .unwrap();

    assert_eq!(response.id, "id1");
    assert_eq!(response.status, StatusCode::Ok);
    assert_eq!(response.amount, Some(100.0));
    assert_eq!(client.pending_requests(), 0);

    let received = engine.received();
    let Message::CashInOut(request) = &received[0] else {
        panic!("unexpected request: {received:?}");
    };
    assert_eq!(request.client_id, "client1");
    assert_eq!(request.asset_id, "USD");
    assert!(request.fee.is_none());
}

#[tokio::test]
async fn test_call_while_disconnected_fails_fast() {
    let client = client_for(dead_addr()).build();
    client.start();

    let result = tokio::time::timeout(
        Duration::from_secs(1),
        client.cash_in_out("id1", "client1", "USD", 100.0),
    )
    .await
    .expect("call must not block while disconnected");

    assert!(matches!(result, Err(ClientError::NotConnected)));
    assert_eq!(client.pending_requests(), 0);
    assert!(!client.is_connected());
    client.shutdown().await;
}

#[tokio::test]
async fn test_stray_responses_are_ignored() {
    let engine = FakeEngine::start(Behavior::StrayFirst).await;
    let client = client_for(engine.addr()).build();
    client.start();
    eventually("connection", || client.is_connected()).await;

    for id in ["a", "b", "c"] {
        let response = client.update_balance(id, "client", "EUR", 5.0).await.unwrap();
        assert_eq!(response.id, id);
        assert_eq!(response.amount, Some(5.0));
    }

    assert_eq!(engine.connections(), 1);
    assert_eq!(client.socket_statistics().reconnects, 0);
    assert!(client.is_connected());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_calls_each_get_their_own_response() {
    let engine = FakeEngine::start(Behavior::Answer).await;
    let client = Arc::new(client_for(engine.addr()).build());
    client.start();
    eventually("connection", || client.is_connected()).await;

    let mut tasks = Vec::new();
    for i in 0..64 {
        let client = Arc::clone(&client);
        tasks.push(tokio::spawn(async move {
            let id = format!("req-{i}");
            let response = client
                .cash_in_out(id.clone(), "client", "USD", f64::from(i))
                .await
                .unwrap();
            (id, response)
        }));
    }

    for (i, task) in tasks.into_iter().enumerate() {
        let (id, response) = task.await.unwrap();
        assert_eq!(response.id, id);
        assert_eq!(response.amount, Some(i as f64));
    }

    // Every frame decoded cleanly on the engine side, so none were split.
    let ids: HashSet<String> = engine
        .received()
        .into_iter()
        .filter_map(|message| match message {
            Message::CashInOut(request) => Some(request.id),
            _ => None,
        })
        .collect();
    assert_eq!(ids.len(), 64);
    assert_eq!(engine.connections(), 1);
}

#[tokio::test]
async fn test_reconnects_after_drop() {
    let engine = FakeEngine::start(Behavior::Answer).await;
    let client = client_for(engine.addr()).build();
    client.start();
    eventually("connection", || client.is_connected()).await;

    engine.drop_connections();
    eventually("reconnect", || client.socket_statistics().reconnects == 1).await;
    eventually("connection", || client.is_connected()).await;

    let response = client.cash_in_out("after", "c", "USD", 1.0).await.unwrap();
    assert!(response.is_ok());
    assert_eq!(engine.connections(), 2);
}

#[tokio::test]
async fn test_pending_request_fails_when_connection_drops() {
    let engine = FakeEngine::start(Behavior::Silent).await;
    let client = Arc::new(client_for(engine.addr()).build());
    client.start();
    eventually("connection", || client.is_connected()).await;

    let caller = Arc::clone(&client);
    let call = tokio::spawn(async move { caller.cash_in_out("lost", "c", "USD", 1.0).await });
    eventually("registration", || client.pending_requests() == 1).await;
    eventually("request on the wire", || !engine.received().is_empty()).await;

    engine.drop_connections();

    assert!(matches!(call.await.unwrap(), Err(ClientError::ConnectionLost)));
    assert_eq!(client.pending_requests(), 0);
}

#[tokio::test]
async fn test_pending_request_survives_drop_without_sweep() {
    let engine = FakeEngine::start(Behavior::Silent).await;
    let client = Arc::new(
        client_for(engine.addr())
            .fail_pending_on_disconnect(false)
            .build(),
    );
    client.start();
    eventually("connection", || client.is_connected()).await;

    let caller = Arc::clone(&client);
    let call = tokio::spawn(async move { caller.cash_in_out("kept", "c", "USD", 1.0).await });
    eventually("registration", || client.pending_requests() == 1).await;
    eventually("request on the wire", || !engine.received().is_empty()).await;

    engine.drop_connections();
    eventually("reconnect", || client.socket_statistics().reconnects == 1).await;
    assert_eq!(client.pending_requests(), 1);

    client.shutdown().await;
    assert!(matches!(call.await.unwrap(), Err(ClientError::Shutdown)));
}

#[tokio::test]
async fn test_request_timeout_cancels_slot() {
    let engine = FakeEngine::start(Behavior::Silent).await;
    let client = client_for(engine.addr())
        .request_timeout(Duration::from_millis(100))
        .build();
    client.start();
    eventually("connection", || client.is_connected()).await;

    let result = client.swap("s1", "a", "USD", 1.0, "b", "EUR", 0.9).await;

    assert!(matches!(result, Err(ClientError::Timeout)));
    assert_eq!(client.pending_requests(), 0);
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_duplicate_key_rejected() {
    let engine = FakeEngine::start(Behavior::Silent).await;
    let client = Arc::new(client_for(engine.addr()).build());
    client.start();
    eventually("connection", || client.is_connected()).await;

    let caller = Arc::clone(&client);
    let first = tokio::spawn(async move { caller.cash_in_out("dup", "c", "USD", 1.0).await });
    eventually("registration", || client.pending_requests() == 1).await;

    let second = client.cash_in_out("dup", "c", "USD", 2.0).await;
    assert!(matches!(second, Err(ClientError::DuplicateKey { key }) if key == "dup"));
    assert_eq!(client.pending_requests(), 1);

    client.shutdown().await;
    assert!(matches!(first.await.unwrap(), Err(ClientError::Shutdown)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_abandoned_calls_keep_the_stream_intact() {
    let engine = FakeEngine::start_paused(Behavior::Answer).await;
    let transport = TcpClientConfig::new(engine.addr())
        .connect_timeout(Duration::from_secs(1))
        .buffer_sizes(Some(4096), Some(4096));
    let client = client_for(engine.addr()).transport(transport).build();
    client.start();
    eventually("connection", || client.is_connected()).await;

    // The engine is not reading, so these fill the socket and every caller
    // gives up partway through its write.
    let bulky = "x".repeat(60_000);
    for i in 0..20 {
        let call = client.cash_in_out(format!("bulky-{i}"), "c", bulky.clone(), 1.0);
        let _ = tokio::time::timeout(Duration::from_millis(20), call).await;
    }
    assert_eq!(client.pending_requests(), 0);

    engine.resume_reads();
    let tail = tokio::time::timeout(
        Duration::from_secs(5),
        client.cash_in_out("tail", "c", "USD", 1.0),
    )
    .await
    .expect("tail request must be answered")
    .unwrap();

    assert_eq!(tail.id, "tail");
    assert_eq!(engine.connections(), 1);
    assert_eq!(engine.received().len(), 21);
    assert_eq!(client.socket_statistics().reconnects, 0);
}

#[tokio::test]
async fn test_oversize_request_leaves_connection_alone() {
    let engine = FakeEngine::start(Behavior::Silent).await;
    let client = Arc::new(client_for(engine.addr()).build());
    client.start();
    eventually("connection", || client.is_connected()).await;

    let caller = Arc::clone(&client);
    let innocent = tokio::spawn(async move { caller.cash_in_out("innocent", "c", "USD", 1.0).await });
    eventually("registration", || client.pending_requests() == 1).await;

    let oversize = client
        .cash_in_out("oversize", "x".repeat(40_000), "y".repeat(40_000), 1.0)
        .await;
    assert!(matches!(
        oversize,
        Err(ClientError::Transport(TransportError::FrameTooLarge { .. }))
    ));

    assert_eq!(client.pending_requests(), 1);
    assert!(client.is_connected());
    assert_eq!(engine.connections(), 1);

    client.shutdown().await;
    assert!(matches!(innocent.await.unwrap(), Err(ClientError::Shutdown)));
}

#[tokio::test]
async fn test_unknown_tag_tears_down_connection() {
    let engine = FakeEngine::start(Behavior::GarbageOnce).await;
    let client = client_for(engine.addr()).build();
    client.start();
    eventually("connection", || client.is_connected()).await;

    let first = client.cash_in_out("first", "c", "USD", 1.0).await;
    assert!(matches!(first, Err(ClientError::ConnectionLost)));

    eventually("reconnect", || client.socket_statistics().reconnects == 1).await;
    eventually("connection", || client.is_connected()).await;
    let second = client.cash_in_out("second", "c", "USD", 1.0).await.unwrap();
    assert_eq!(second.id, "second");
}

#[tokio::test]
async fn test_shutdown_stops_client() {
    let engine = FakeEngine::start(Behavior::Silent).await;
    let client = Arc::new(client_for(engine.addr()).build());
    client.start();
    eventually("connection", || client.is_connected()).await;

    let caller = Arc::clone(&client);
    let call = tokio::spawn(async move { caller.cancel_limit_order("order-1").await });
    eventually("registration", || client.pending_requests() == 1).await;

    client.shutdown().await;

    assert!(matches!(call.await.unwrap(), Err(ClientError::Shutdown)));
    assert!(!client.is_connected());
    assert!(matches!(
        client.cash_in_out("late", "c", "USD", 1.0).await,
        Err(ClientError::Shutdown)
    ));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(engine.connections(), 1);
}

#[tokio::test]
async fn test_legacy_market_order() {
    let engine = FakeEngine::start(Behavior::Answer).await;
    let client = client_for(engine.addr()).build();
    client.start();
    eventually("connection", || client.is_connected()).await;

    let first = client
        .handle_market_order_legacy("c", "BTCUSD", OrderAction::Sell, 2.0, true, None)
        .await
        .unwrap();
    let second = client
        .handle_market_order_legacy("c", "BTCUSD", OrderAction::Buy, 3.0, false, Some(1.0))
        .await
        .unwrap();

    assert_eq!(first.as_deref(), Some("record-1"));
    assert_eq!(second.as_deref(), Some("record-2"));

    let volumes: Vec<f64> = engine
        .received()
        .into_iter()
        .filter_map(|message| match message {
            Message::LegacyMarketOrder(order) => Some(order.volume),
            _ => None,
        })
        .collect();
    assert_eq!(volumes, vec![-2.0, 3.0]);
}

#[tokio::test]
async fn test_orders() {
    let engine = FakeEngine::start(Behavior::Answer).await;
    let client = client_for(engine.addr()).build();
    client.start();
    eventually("connection", || client.is_connected()).await;

    let market = client
        .handle_market_order(MarketOrder::new("mo-1", "c", "ETHUSD", 1.5, true))
        .await
        .unwrap();
    assert!(market.is_ok());
    assert_eq!(market.id, "mo-1");
    assert_eq!(market.price, Some(100.0));

    let rejected = client
        .place_limit_order(LimitOrder::new("lo-1", "c", "ETHUSD", 0.0, 2_000.0))
        .await
        .unwrap();
    assert_eq!(rejected.status, StatusCode::TooSmallVolume);
    assert_eq!(rejected.status_reason.as_deref(), Some("volume is zero"));

    let cancelled = client.cancel_limit_order("lo-1").await.unwrap();
    assert!(cancelled.is_ok());

    let transfer = client
        .transfer("t-1", "a", "b", "USD", 10.0, 0.0, None)
        .await
        .unwrap();
    assert!(transfer.is_ok());
}

#[tokio::test]
async fn test_cash_in_out_with_fee_is_encoded() {
    let engine = FakeEngine::start(Behavior::Answer).await;
    let client = client_for(engine.addr()).build();
    client.start();
    eventually("connection", || client.is_connected()).await;

    client
        .cash_in_out_with_fee(
            "fee-1",
            "c",
            "USD",
            50.0,
            "fee-wallet",
            0.5,
            mexlink_core::FeeSizeType::Percentage,
        )
        .await
        .unwrap();

    let received = engine.received();
    let Message::CashInOut(request) = &received[0] else {
        panic!("unexpected request: {received:?}");
    };
    let fee = request.fee.as_ref().unwrap();
    assert_eq!(fee.target_client_id.as_deref(), Some("fee-wallet"));
    assert_eq!(fee.maker_size, 0.5);
}

#[tokio::test]
async fn test_keep_alive() {
    let engine = FakeEngine::start(Behavior::Answer).await;
    let client = client_for(engine.addr())
        .ping_interval(Duration::from_millis(30))
        .build();
    client.start();

    eventually("keep-alive", || {
        engine
            .received()
            .iter()
            .any(|message| matches!(message, Message::Ping(_)))
    })
    .await;
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_statistics_track_traffic() {
    let engine = FakeEngine::start(Behavior::Answer).await;
    let client = client_for(engine.addr()).build();
    assert_eq!(client.socket_statistics().last_connected, None);

    client.start();
    eventually("connection", || client.is_connected()).await;
    client.update_balance("b-1", "c", "USD", 1.0).await.unwrap();

    let stats = client.socket_statistics();
    assert!(stats.connected);
    assert_eq!(stats.frames_sent, 1);
    assert_eq!(stats.frames_received, 1);
    assert!(stats.bytes_sent > 0);
    assert!(stats.bytes_received > 0);
    assert!(stats.last_activity.is_some());
    assert!(stats.last_connected.is_some());
}
