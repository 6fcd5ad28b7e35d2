//! Representative messages for benchmarks.

use bytes::BytesMut;
use mexlink_core::{
    CashInOut, Fee, FeeSizeType, LimitOrder, MarketOrder, MarketOrderResponse, Message,
    NewResponse, StatusCode,
};

/// A cash deposit without a fee.
#[must_use]
pub fn cash_in_out() -> Message {
    CashInOut::new("0f8b7c1e-6a41-4d0b-9a53-3c1d2e4f5a6b", "client-1", "USD", 100.0, None).into()
}

/// A limit order carrying a fee, the largest request in the catalogue.
#[must_use]
pub fn limit_order_with_fee() -> Message {
    LimitOrder::new("order-000000000001", "client-1", "BTCUSD", 0.25, 20_000.0)
        .cancel_all_previous(true)
        .with_fee(Fee::client("fee-wallet", 0.1, FeeSizeType::Percentage))
        .into()
}

/// A market order with a reserved volume.
#[must_use]
pub fn market_order() -> Message {
    MarketOrder::new("market-000000000001", "client-1", "ETHUSD", -1.5, true)
        .reserved_limit_volume(2.0)
        .into()
}

/// A generic response carrying an amount.
#[must_use]
pub fn new_response(id: &str) -> Message {
    NewResponse {
        amount: Some(100.0),
        ..NewResponse::ok(id)
    }
    .into()
}

/// A market order response with a price.
#[must_use]
pub fn market_order_response(id: &str) -> Message {
    MarketOrderResponse {
        id: id.to_string(),
        status: StatusCode::Ok,
        status_reason: None,
        price: Some(2_001.25),
    }
    .into()
}

/// `count` back-to-back response frames, as the read loop would see them.
///
/// # Panics
/// Panics if a fixture fails to encode, which would be a bug in the
/// fixtures themselves.
#[must_use]
pub fn response_stream(count: usize) -> BytesMut {
    let mut buf = BytesMut::with_capacity(count * 48);
    for i in 0..count {
        new_response(&format!("req-{i}"))
            .encode(&mut buf)
            .expect("fixture encodes");
    }
    buf
}
