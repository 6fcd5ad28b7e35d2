//! Prelude module for convenient imports.
//!
//! ```ignore
//! use mexlink::prelude::*;
//! ```

// Wire types
pub use mexlink_core::error::{Error as CoreError, Result as CoreResult};
pub use mexlink_core::{
    BalanceUpdate, CashInOut, CorrelationKey, Fee, FeeSizeType, FeeType, Frame, LegacyMarketOrder,
    LegacyResponse, LimitOrder, LimitOrderCancel, MarketOrder, MarketOrderResponse, Message,
    MessageType, NewResponse, OrderAction, Ping, StatusCode, Swap, Transfer,
};

// Transport types
pub use mexlink_transport::TransportError;
pub use mexlink_transport::tcp::{FrameCodec, TcpClientConfig, TcpServer, TcpServerConfig};

// Client types
pub use mexlink_client::{
    ClientBuilder, ClientError, MarketOrderResult, MatchingEngineClient, MeResponse,
    SocketStatistics,
};

pub use std::time::Duration;
