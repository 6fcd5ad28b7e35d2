//! Wire-level enums and shared sub-structures.

use crate::decoder::PayloadReader;
use crate::encoder::PayloadWriter;
use crate::error::{Error, Result};

/// Message type tag carried by every frame.
///
/// The catalogue is closed: any tag not listed here is a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// Response to a legacy numeric-keyed request.
    LegacyResponse = 0,
    /// Keep-alive.
    Ping = 1,
    /// Cash deposit or withdrawal.
    CashInOut = 2,
    /// Transfer between two clients.
    Transfer = 3,
    /// Limit order placement.
    LimitOrder = 4,
    /// Legacy numeric-keyed market order.
    LegacyMarketOrder = 5,
    /// Limit order cancellation.
    LimitOrderCancel = 6,
    /// Direct balance update.
    BalanceUpdate = 7,
    /// Two-sided asset swap.
    Swap = 8,
    /// String-keyed market order.
    MarketOrder = 9,
    /// Generic response to string-keyed requests.
    NewResponse = 99,
    /// Response to a string-keyed market order.
    MarketOrderResponse = 100,
}

impl MessageType {
    /// Returns the wire tag.
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Returns true for the three response kinds.
    #[must_use]
    pub const fn is_response(self) -> bool {
        matches!(
            self,
            Self::LegacyResponse | Self::NewResponse | Self::MarketOrderResponse
        )
    }
}

impl TryFrom<u8> for MessageType {
    type Error = Error;

    fn try_from(tag: u8) -> Result<Self> {
        Ok(match tag {
            0 => Self::LegacyResponse,
            1 => Self::Ping,
            2 => Self::CashInOut,
            3 => Self::Transfer,
            4 => Self::LimitOrder,
            5 => Self::LegacyMarketOrder,
            6 => Self::LimitOrderCancel,
            7 => Self::BalanceUpdate,
            8 => Self::Swap,
            9 => Self::MarketOrder,
            99 => Self::NewResponse,
            100 => Self::MarketOrderResponse,
            _ => return Err(Error::UnknownMessageType { tag }),
        })
    }
}

/// Status code reported by the matching engine.
///
/// Codes outside the known set are kept as [`StatusCode::Other`] so a newer
/// engine cannot break the read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// Request processed.
    Ok,
    /// Balance too low.
    LowBalance,
    /// Request id already processed.
    AlreadyProcessed,
    /// Asset not known to the engine.
    UnknownAsset,
    /// Not enough liquidity to fill.
    NoLiquidity,
    /// Not enough funds.
    NotEnoughFunds,
    /// Volume below dust threshold.
    Dust,
    /// Reserved volume exceeds balance.
    ReservedVolumeHigherThanBalance,
    /// Referenced entity not found.
    NotFound,
    /// Balance lower than reserved amount.
    BalanceLowerThanReserved,
    /// Order would cross the spread.
    LeadToNegativeSpread,
    /// Volume below the asset pair minimum.
    TooSmallVolume,
    /// Fee structure rejected.
    InvalidFee,
    /// Duplicate request.
    Duplicate,
    /// Engine-side runtime failure.
    Runtime,
    /// Code not in the known set.
    Other(i32),
}

impl StatusCode {
    /// Returns the wire code.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Ok => 0,
            Self::LowBalance => 401,
            Self::AlreadyProcessed => 402,
            Self::UnknownAsset => 410,
            Self::NoLiquidity => 411,
            Self::NotEnoughFunds => 412,
            Self::Dust => 413,
            Self::ReservedVolumeHigherThanBalance => 414,
            Self::NotFound => 415,
            Self::BalanceLowerThanReserved => 416,
            Self::LeadToNegativeSpread => 417,
            Self::TooSmallVolume => 418,
            Self::InvalidFee => 419,
            Self::Duplicate => 430,
            Self::Runtime => 500,
            Self::Other(code) => code,
        }
    }

    /// Returns true if the engine accepted the request.
    #[must_use]
    pub const fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl From<i32> for StatusCode {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Ok,
            401 => Self::LowBalance,
            402 => Self::AlreadyProcessed,
            410 => Self::UnknownAsset,
            411 => Self::NoLiquidity,
            412 => Self::NotEnoughFunds,
            413 => Self::Dust,
            414 => Self::ReservedVolumeHigherThanBalance,
            415 => Self::NotFound,
            416 => Self::BalanceLowerThanReserved,
            417 => Self::LeadToNegativeSpread,
            418 => Self::TooSmallVolume,
            419 => Self::InvalidFee,
            430 => Self::Duplicate,
            500 => Self::Runtime,
            other => Self::Other(other),
        }
    }
}

/// Who is charged a fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FeeType {
    /// No fee.
    #[default]
    NoFee = 0,
    /// Fee charged to the client.
    ClientFee = 1,
    /// Fee charged to an external account.
    ExternalFee = 2,
}

impl TryFrom<u8> for FeeType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::NoFee),
            1 => Ok(Self::ClientFee),
            2 => Ok(Self::ExternalFee),
            _ => Err(Error::InvalidEnumValue {
                field: "fee.kind",
                value: i64::from(value),
            }),
        }
    }
}

/// How fee sizes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum FeeSizeType {
    /// Sizes are absolute amounts.
    #[default]
    Absolute = 0,
    /// Sizes are fractions of the operation amount.
    Percentage = 1,
}

impl TryFrom<u8> for FeeSizeType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Absolute),
            1 => Ok(Self::Percentage),
            _ => Err(Error::InvalidEnumValue {
                field: "fee.size_type",
                value: i64::from(value),
            }),
        }
    }
}

/// Market order side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderAction {
    /// Buy side.
    Buy,
    /// Sell side.
    Sell,
}

impl OrderAction {
    /// Applies the side to an unsigned volume: sells are negative.
    #[must_use]
    pub fn signed_volume(self, volume: f64) -> f64 {
        match self {
            Self::Buy => volume.abs(),
            Self::Sell => -volume.abs(),
        }
    }
}

/// Fee sub-structure attached to cash, transfer and order messages.
///
/// # Wire Format
/// ```text
/// kind             (u8)
/// size_type        (u8)
/// maker_size       (f64)
/// taker_size       (f64)
/// source_client_id (optional string)
/// target_client_id (optional string)
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fee {
    /// Who is charged.
    pub kind: FeeType,
    /// How sizes are interpreted.
    pub size_type: FeeSizeType,
    /// Size applied to the maker side.
    pub maker_size: f64,
    /// Size applied to the taker side.
    pub taker_size: f64,
    /// Client the fee is taken from.
    pub source_client_id: Option<String>,
    /// Client the fee is paid to.
    pub target_client_id: Option<String>,
}

impl Fee {
    /// Creates a client fee paid to `target_client_id`, with the same size
    /// on both sides.
    #[must_use]
    pub fn client(target_client_id: impl Into<String>, size: f64, size_type: FeeSizeType) -> Self {
        Self {
            kind: FeeType::ClientFee,
            size_type,
            maker_size: size,
            taker_size: size,
            source_client_id: None,
            target_client_id: Some(target_client_id.into()),
        }
    }

    /// Writes the fee fields.
    ///
    /// # Errors
    /// Returns `StringTooLong` if a client id does not fit the wire format.
    pub fn encode(&self, writer: &mut PayloadWriter<'_>) -> Result<()> {
        writer.write_u8(self.kind as u8);
        writer.write_u8(self.size_type as u8);
        writer.write_f64(self.maker_size);
        writer.write_f64(self.taker_size);
        writer.write_optional_str(self.source_client_id.as_deref())?;
        writer.write_optional_str(self.target_client_id.as_deref())
    }

    /// Reads the fee fields.
    ///
    /// # Errors
    /// Returns an error if the fee is truncated or an enum value is invalid.
    pub fn decode(reader: &mut PayloadReader<'_>) -> Result<Self> {
        Ok(Self {
            kind: FeeType::try_from(reader.read_u8()?)?,
            size_type: FeeSizeType::try_from(reader.read_u8()?)?,
            maker_size: reader.read_f64()?,
            taker_size: reader.read_f64()?,
            source_client_id: reader.read_optional_string()?,
            target_client_id: reader.read_optional_string()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_message_type_tags() {
        for tag in [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9, 99, 100] {
            let ty = MessageType::try_from(tag).unwrap();
            assert_eq!(ty.tag(), tag);
        }
    }

    #[test]
    fn test_message_type_unknown_tag() {
        assert_eq!(
            MessageType::try_from(42).unwrap_err(),
            Error::UnknownMessageType { tag: 42 }
        );
    }

    #[test]
    fn test_message_type_is_response() {
        assert!(MessageType::NewResponse.is_response());
        assert!(MessageType::LegacyResponse.is_response());
        assert!(MessageType::MarketOrderResponse.is_response());
        assert!(!MessageType::CashInOut.is_response());
        assert!(!MessageType::Ping.is_response());
    }

    #[test]
    fn test_status_code_known_and_other() {
        assert_eq!(StatusCode::from(0), StatusCode::Ok);
        assert_eq!(StatusCode::from(412), StatusCode::NotEnoughFunds);
        assert_eq!(StatusCode::from(777), StatusCode::Other(777));
        assert_eq!(StatusCode::Other(777).code(), 777);
        assert_eq!(StatusCode::Duplicate.code(), 430);
        assert!(StatusCode::Ok.is_ok());
        assert!(!StatusCode::Runtime.is_ok());
    }

    #[test]
    fn test_fee_type_invalid() {
        assert!(FeeType::try_from(3).is_err());
        assert!(FeeSizeType::try_from(2).is_err());
    }

    #[test]
    fn test_signed_volume() {
        assert_eq!(OrderAction::Buy.signed_volume(2.0), 2.0);
        assert_eq!(OrderAction::Sell.signed_volume(2.0), -2.0);
        assert_eq!(OrderAction::Sell.signed_volume(-2.0), -2.0);
    }

    #[test]
    fn test_fee_encode_decode() {
        let fee = Fee {
            kind: FeeType::ExternalFee,
            size_type: FeeSizeType::Percentage,
            maker_size: 0.01,
            taker_size: 0.02,
            source_client_id: Some("src".into()),
            target_client_id: None,
        };

        let mut buf = BytesMut::new();
        fee.encode(&mut PayloadWriter::new(&mut buf)).unwrap();

        let mut reader = PayloadReader::new(&buf);
        assert_eq!(Fee::decode(&mut reader).unwrap(), fee);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_fee_client_constructor() {
        let fee = Fee::client("fee-wallet", 1.5, FeeSizeType::Absolute);
        assert_eq!(fee.kind, FeeType::ClientFee);
        assert_eq!(fee.maker_size, 1.5);
        assert_eq!(fee.taker_size, 1.5);
        assert_eq!(fee.target_client_id.as_deref(), Some("fee-wallet"));
    }
}
