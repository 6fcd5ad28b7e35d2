//! # mexlink Core
//!
//! Wire types for the matching-engine binary protocol.
//!
//! This crate provides:
//! - The frame header and the closed [`Message`] sum type
//! - One struct per message in the catalogue, with payload encoders/decoders
//! - Bounds-checked payload reader and writer
//! - Error types for encoding/decoding operations
//!
//! Everything here is a pure transform; there is no I/O and no state.

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod header;
pub mod messages;
pub mod types;

pub use decoder::{PayloadDecoder, PayloadReader};
pub use encoder::{PayloadEncoder, PayloadWriter};
pub use error::{Error, Result};
pub use frame::{CorrelationKey, Frame, Message};
pub use header::FrameHeader;
pub use messages::{
    BalanceUpdate, CashInOut, LegacyMarketOrder, LegacyResponse, LimitOrder, LimitOrderCancel,
    MarketOrder, MarketOrderResponse, NewResponse, Ping, Swap, Transfer,
};
pub use types::{Fee, FeeSizeType, FeeType, MessageType, OrderAction, StatusCode};
