//! # mexlink Client
//!
//! Reconnecting, multiplexed client for the matching-engine protocol.
//!
//! This crate provides:
//! - Per-namespace correlation tables with single-resolution pending slots
//! - A session per live connection, with serialized writes and a read loop
//! - A connection manager that reconnects after a fixed delay, forever
//! - The [`MatchingEngineClient`] facade and its [`ClientBuilder`]

pub mod builder;
pub mod client;
pub mod connection;
pub mod correlation;
pub mod error;
pub mod pending;
pub mod reconnect;
pub mod response;
pub mod session;
pub mod stats;

pub use builder::ClientBuilder;
pub use client::MatchingEngineClient;
pub use connection::{ConnectionConfig, ConnectionManager};
pub use correlation::{CorrelationTables, Routed};
pub use error::ClientError;
pub use pending::{PendingHandle, PendingTable};
pub use reconnect::{ReconnectConfig, ReconnectState};
pub use response::{MarketOrderResult, MeResponse};
pub use session::Session;
pub use stats::{ConnectionStats, SocketStatistics};
