#![allow(dead_code)]

pub mod engine;

use mexlink_client::ClientBuilder;
use std::net::SocketAddr;
use std::time::Duration;

/// Builder with a short reconnect delay so tests do not wait out the default.
pub fn client_for(addr: SocketAddr) -> ClientBuilder {
    ClientBuilder::new(addr)
        .connect_timeout(Duration::from_secs(1))
        .reconnect_delay(Duration::from_millis(50))
}

/// Polls `condition` until it holds, failing the test after five seconds.
pub async fn eventually(what: &str, condition: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for {what}"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Returns an address with nothing listening on it.
pub fn dead_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}
