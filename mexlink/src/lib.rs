//! # mexlink
//!
//! Client runtime for a remote matching engine speaking a length-prefixed,
//! type-tagged binary protocol over one long-lived TCP connection.
//!
//! Many concurrent callers share the connection; each gets exactly its own
//! response, or a well-defined failure. The connection reconnects after a
//! fixed delay for as long as the client lives.
//!
//! ## Quick Start
//!
//! ```ignore
//! use mexlink::prelude::*;
//!
//! let client = ClientBuilder::parse("127.0.0.1:8888")?
//!     .request_timeout(Duration::from_secs(5))
//!     .build();
//! client.start();
//!
//! let response = client.cash_in_out("id1", "client1", "USD", 100.0).await?;
//! assert_eq!(response.amount, Some(100.0));
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`] - Message catalogue, payload codec, frame encode/decode
//! - [`transport`] - Stream framing codec, TCP client and server
//! - [`client`] - Correlation tables, sessions, connection manager, facade

pub mod prelude;

/// Wire types and the pure frame codec.
pub mod core {
    pub use mexlink_core::*;
}

/// TCP transport and stream framing.
pub mod transport {
    pub use mexlink_transport::*;
}

/// Connection, correlation and client facade.
pub mod client {
    pub use mexlink_client::*;
}

pub use mexlink_client::{ClientBuilder, ClientError, MatchingEngineClient};
pub use mexlink_core::{Frame, Message};
