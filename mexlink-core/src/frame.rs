//! Frames and the closed message sum type.
//!
//! A frame on the wire is `[u32 LE length][u8 tag][payload]`, where the
//! length counts the tag and the payload. [`Message::encode`] produces one
//! complete frame; [`Frame`] is the raw split form handed up by the stream
//! codec, turned into a [`Message`] with [`Frame::decode`].

use crate::decoder::PayloadDecoder;
use crate::encoder::{PayloadEncoder, PayloadWriter};
use crate::error::{Error, Result};
use crate::header::FrameHeader;
use crate::messages::{
    BalanceUpdate, CashInOut, LegacyMarketOrder, LegacyResponse, LimitOrder, LimitOrderCancel,
    MarketOrder, MarketOrderResponse, NewResponse, Ping, Swap, Transfer,
};
use crate::types::MessageType;
use bytes::{Bytes, BytesMut};
use std::fmt;

/// Correlation key of a request or response, tagged with its namespace.
///
/// Keys from different namespaces never collide, even when their values are
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CorrelationKey {
    /// Numeric id used by legacy market orders.
    Legacy(i64),
    /// String id shared by the generic request family.
    Id(String),
    /// String id used by market orders.
    MarketOrder(String),
}

impl fmt::Display for CorrelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Legacy(id) => write!(f, "legacy:{id}"),
            Self::Id(id) => write!(f, "id:{id}"),
            Self::MarketOrder(id) => write!(f, "market:{id}"),
        }
    }
}

/// Every message the protocol knows about.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Legacy numeric-keyed response.
    LegacyResponse(LegacyResponse),
    /// Keep-alive.
    Ping(Ping),
    /// Cash in/out request.
    CashInOut(CashInOut),
    /// Transfer request.
    Transfer(Transfer),
    /// Limit order request.
    LimitOrder(LimitOrder),
    /// Legacy market order request.
    LegacyMarketOrder(LegacyMarketOrder),
    /// Limit order cancellation request.
    LimitOrderCancel(LimitOrderCancel),
    /// Balance update request.
    BalanceUpdate(BalanceUpdate),
    /// Swap request.
    Swap(Swap),
    /// Market order request.
    MarketOrder(MarketOrder),
    /// Generic response.
    NewResponse(NewResponse),
    /// Market order response.
    MarketOrderResponse(MarketOrderResponse),
}

impl Message {
    /// Returns the type tag for this message.
    #[must_use]
    pub fn message_type(&self) -> MessageType {
        match self {
            Self::LegacyResponse(_) => MessageType::LegacyResponse,
            Self::Ping(_) => MessageType::Ping,
            Self::CashInOut(_) => MessageType::CashInOut,
            Self::Transfer(_) => MessageType::Transfer,
            Self::LimitOrder(_) => MessageType::LimitOrder,
            Self::LegacyMarketOrder(_) => MessageType::LegacyMarketOrder,
            Self::LimitOrderCancel(_) => MessageType::LimitOrderCancel,
            Self::BalanceUpdate(_) => MessageType::BalanceUpdate,
            Self::Swap(_) => MessageType::Swap,
            Self::MarketOrder(_) => MessageType::MarketOrder,
            Self::NewResponse(_) => MessageType::NewResponse,
            Self::MarketOrderResponse(_) => MessageType::MarketOrderResponse,
        }
    }

    /// Returns the correlation key, or `None` for keep-alives.
    #[must_use]
    pub fn correlation_key(&self) -> Option<CorrelationKey> {
        Some(match self {
            Self::Ping(_) => return None,
            Self::LegacyResponse(m) => CorrelationKey::Legacy(m.process_id),
            Self::LegacyMarketOrder(m) => CorrelationKey::Legacy(m.id),
            Self::CashInOut(m) => CorrelationKey::Id(m.id.clone()),
            Self::Transfer(m) => CorrelationKey::Id(m.id.clone()),
            Self::LimitOrder(m) => CorrelationKey::Id(m.id.clone()),
            Self::LimitOrderCancel(m) => CorrelationKey::Id(m.id.clone()),
            Self::BalanceUpdate(m) => CorrelationKey::Id(m.id.clone()),
            Self::Swap(m) => CorrelationKey::Id(m.id.clone()),
            Self::NewResponse(m) => CorrelationKey::Id(m.id.clone()),
            Self::MarketOrder(m) => CorrelationKey::MarketOrder(m.id.clone()),
            Self::MarketOrderResponse(m) => CorrelationKey::MarketOrder(m.id.clone()),
        })
    }

    /// Appends one complete frame for this message to `dst`.
    ///
    /// The header is reserved first and filled in once the payload length is
    /// known, so `dst` only ever holds whole frames on success.
    ///
    /// # Errors
    /// Returns an error if a field cannot be encoded. `dst` is left as it
    /// was before the call.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        dst.resize(start + FrameHeader::ENCODED_LENGTH, 0);

        let written = {
            let mut writer = PayloadWriter::new(dst);
            self.encode_payload(&mut writer)
                .map(|()| writer.bytes_written())
        };

        let payload_len = match written.and_then(|size| {
            u32::try_from(size)
                .ok()
                .filter(|len| *len < u32::MAX)
                .ok_or(Error::FrameTooLarge { size })
        }) {
            Ok(len) => len,
            Err(e) => {
                dst.truncate(start);
                return Err(e);
            }
        };

        let header = FrameHeader::new(self.message_type().tag(), payload_len);
        header.encode(&mut dst[start..]);
        Ok(())
    }

    /// Encodes this message into a standalone frame.
    ///
    /// # Errors
    /// Returns an error if a field cannot be encoded.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(128);
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decodes a payload given its raw tag.
    ///
    /// # Errors
    /// Returns `UnknownMessageType` for tags outside the catalogue, or a
    /// field-level error if the payload is malformed.
    pub fn decode_payload(tag: u8, payload: &[u8]) -> Result<Self> {
        Ok(match MessageType::try_from(tag)? {
            MessageType::LegacyResponse => Self::LegacyResponse(LegacyResponse::decode(payload)?),
            MessageType::Ping => Self::Ping(Ping::decode(payload)?),
            MessageType::CashInOut => Self::CashInOut(CashInOut::decode(payload)?),
            MessageType::Transfer => Self::Transfer(Transfer::decode(payload)?),
            MessageType::LimitOrder => Self::LimitOrder(LimitOrder::decode(payload)?),
            MessageType::LegacyMarketOrder => {
                Self::LegacyMarketOrder(LegacyMarketOrder::decode(payload)?)
            }
            MessageType::LimitOrderCancel => {
                Self::LimitOrderCancel(LimitOrderCancel::decode(payload)?)
            }
            MessageType::BalanceUpdate => Self::BalanceUpdate(BalanceUpdate::decode(payload)?),
            MessageType::Swap => Self::Swap(Swap::decode(payload)?),
            MessageType::MarketOrder => Self::MarketOrder(MarketOrder::decode(payload)?),
            MessageType::NewResponse => Self::NewResponse(NewResponse::decode(payload)?),
            MessageType::MarketOrderResponse => {
                Self::MarketOrderResponse(MarketOrderResponse::decode(payload)?)
            }
        })
    }

    /// Decodes exactly one complete frame.
    ///
    /// # Errors
    /// Returns an error if the buffer is not exactly one well-formed frame.
    pub fn decode_frame(buffer: &[u8]) -> Result<Self> {
        let header = FrameHeader::wrap(buffer)?;
        let frame_len = header.frame_len();
        if buffer.len() < frame_len {
            return Err(Error::BufferTooShort {
                required: frame_len,
                available: buffer.len(),
            });
        }
        if buffer.len() > frame_len {
            return Err(Error::TrailingBytes {
                remaining: buffer.len() - frame_len,
            });
        }
        Self::decode_payload(header.tag, &buffer[FrameHeader::ENCODED_LENGTH..])
    }

    fn encode_payload(&self, writer: &mut PayloadWriter<'_>) -> Result<()> {
        match self {
            Self::LegacyResponse(m) => m.encode_payload(writer),
            Self::Ping(m) => m.encode_payload(writer),
            Self::CashInOut(m) => m.encode_payload(writer),
            Self::Transfer(m) => m.encode_payload(writer),
            Self::LimitOrder(m) => m.encode_payload(writer),
            Self::LegacyMarketOrder(m) => m.encode_payload(writer),
            Self::LimitOrderCancel(m) => m.encode_payload(writer),
            Self::BalanceUpdate(m) => m.encode_payload(writer),
            Self::Swap(m) => m.encode_payload(writer),
            Self::MarketOrder(m) => m.encode_payload(writer),
            Self::NewResponse(m) => m.encode_payload(writer),
            Self::MarketOrderResponse(m) => m.encode_payload(writer),
        }
    }
}

macro_rules! impl_from_message {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Message {
                fn from(msg: $variant) -> Self {
                    Self::$variant(msg)
                }
            }
        )*
    };
}

impl_from_message!(
    LegacyResponse,
    Ping,
    CashInOut,
    Transfer,
    LimitOrder,
    LegacyMarketOrder,
    LimitOrderCancel,
    BalanceUpdate,
    Swap,
    MarketOrder,
    NewResponse,
    MarketOrderResponse,
);

/// One frame split off the byte stream, not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw type tag.
    pub tag: u8,
    /// Payload bytes following the tag.
    pub payload: Bytes,
}

impl Frame {
    /// Returns the number of bytes this frame occupied on the wire.
    #[must_use]
    pub fn wire_len(&self) -> usize {
        FrameHeader::ENCODED_LENGTH + self.payload.len()
    }

    /// Decodes the payload into a typed message.
    ///
    /// # Errors
    /// Returns an error for unknown tags or malformed payloads.
    pub fn decode(&self) -> Result<Message> {
        Message::decode_payload(self.tag, &self.payload)
    }
}
