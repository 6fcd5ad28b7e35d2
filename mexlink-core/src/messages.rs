//! Message catalogue.
//!
//! One struct per frame type. Constructors stamp `timestamp` with the current
//! UTC time in milliseconds; everything else is supplied by the caller.

use crate::decoder::{PayloadDecoder, PayloadReader};
use crate::encoder::{PayloadEncoder, PayloadWriter};
use crate::error::Result;
use crate::types::{Fee, MessageType, StatusCode};

/// A value that knows its own wire representation.
pub trait WireField: Sized {
    /// Writes the value.
    ///
    /// # Errors
    /// Returns an error if the value cannot be represented on the wire.
    fn write(&self, writer: &mut PayloadWriter<'_>) -> Result<()>;

    /// Reads the value.
    ///
    /// # Errors
    /// Returns an error if the bytes are truncated or invalid.
    fn read(reader: &mut PayloadReader<'_>, field: &'static str) -> Result<Self>;
}

impl WireField for String {
    fn write(&self, writer: &mut PayloadWriter<'_>) -> Result<()> {
        writer.write_str(self)
    }

    fn read(reader: &mut PayloadReader<'_>, _field: &'static str) -> Result<Self> {
        reader.read_string()
    }
}

impl WireField for i64 {
    fn write(&self, writer: &mut PayloadWriter<'_>) -> Result<()> {
        writer.write_i64(*self);
        Ok(())
    }

    fn read(reader: &mut PayloadReader<'_>, _field: &'static str) -> Result<Self> {
        reader.read_i64()
    }
}

impl WireField for f64 {
    fn write(&self, writer: &mut PayloadWriter<'_>) -> Result<()> {
        writer.write_f64(*self);
        Ok(())
    }

    fn read(reader: &mut PayloadReader<'_>, _field: &'static str) -> Result<Self> {
        reader.read_f64()
    }
}

impl WireField for bool {
    fn write(&self, writer: &mut PayloadWriter<'_>) -> Result<()> {
        writer.write_bool(*self);
        Ok(())
    }

    fn read(reader: &mut PayloadReader<'_>, field: &'static str) -> Result<Self> {
        reader.read_bool(field)
    }
}

impl WireField for StatusCode {
    fn write(&self, writer: &mut PayloadWriter<'_>) -> Result<()> {
        writer.write_i32(self.code());
        Ok(())
    }

    fn read(reader: &mut PayloadReader<'_>, _field: &'static str) -> Result<Self> {
        reader.read_i32().map(StatusCode::from)
    }
}

impl WireField for Fee {
    fn write(&self, writer: &mut PayloadWriter<'_>) -> Result<()> {
        self.encode(writer)
    }

    fn read(reader: &mut PayloadReader<'_>, _field: &'static str) -> Result<Self> {
        Fee::decode(reader)
    }
}

impl<T: WireField> WireField for Option<T> {
    fn write(&self, writer: &mut PayloadWriter<'_>) -> Result<()> {
        writer.write_optional(self.as_ref(), |w, v| v.write(w))
    }

    fn read(reader: &mut PayloadReader<'_>, field: &'static str) -> Result<Self> {
        reader.read_optional(|r| T::read(r, field))
    }
}

/// Declares a catalogue message and derives its payload codec from the
/// field list. Field order here is wire order.
macro_rules! wire_message {
    (
        $(#[$meta:meta])*
        $name:ident => $ty:ident {
            $( $(#[$fmeta:meta])* $field:ident : $fty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: $fty, )*
        }

        impl PayloadEncoder for $name {
            const MESSAGE_TYPE: MessageType = MessageType::$ty;

            fn encode_payload(&self, writer: &mut PayloadWriter<'_>) -> Result<()> {
                $( WireField::write(&self.$field, writer)?; )*
                Ok(())
            }
        }

        impl PayloadDecoder for $name {
            const MESSAGE_TYPE: MessageType = MessageType::$ty;

            fn decode_payload(reader: &mut PayloadReader<'_>) -> Result<Self> {
                Ok(Self {
                    $( $field: <$fty as WireField>::read(reader, stringify!($field))?, )*
                })
            }
        }
    };
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

wire_message! {
    /// Response to a [`LegacyMarketOrder`], keyed by the numeric request id.
    LegacyResponse => LegacyResponse {
        /// Echo of the request id.
        process_id: i64,
        /// Identifier of the record created by the engine.
        record_id: Option<String>,
    }
}

/// Keep-alive frame with an empty payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ping;

impl PayloadEncoder for Ping {
    const MESSAGE_TYPE: MessageType = MessageType::Ping;

    fn encode_payload(&self, _writer: &mut PayloadWriter<'_>) -> Result<()> {
        Ok(())
    }
}

impl PayloadDecoder for Ping {
    const MESSAGE_TYPE: MessageType = MessageType::Ping;

    fn decode_payload(_reader: &mut PayloadReader<'_>) -> Result<Self> {
        Ok(Self)
    }
}

wire_message! {
    /// Cash deposit (positive amount) or withdrawal (negative amount).
    CashInOut => CashInOut {
        /// Correlation id.
        id: String,
        /// Client whose balance changes.
        client_id: String,
        /// Creation time, ms since the Unix epoch.
        timestamp: i64,
        /// Asset identifier.
        asset_id: String,
        /// Signed amount.
        amount: f64,
        /// Optional fee.
        fee: Option<Fee>,
    }
}

impl CashInOut {
    /// Creates a cash operation stamped with the current time.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        client_id: impl Into<String>,
        asset_id: impl Into<String>,
        amount: f64,
        fee: Option<Fee>,
    ) -> Self {
        Self {
            id: id.into(),
            client_id: client_id.into(),
            timestamp: now_millis(),
            asset_id: asset_id.into(),
            amount,
            fee,
        }
    }
}

wire_message! {
    /// Transfer of an asset between two clients.
    Transfer => Transfer {
        /// Correlation id.
        id: String,
        /// Creation time, ms since the Unix epoch.
        timestamp: i64,
        /// Paying client.
        from_client_id: String,
        /// Receiving client.
        to_client_id: String,
        /// Asset identifier.
        asset_id: String,
        /// Amount transferred.
        amount: f64,
        /// Overdraft the paying client may go into.
        overdraft_limit: f64,
        /// Optional fee.
        fee: Option<Fee>,
    }
}

impl Transfer {
    /// Creates a transfer stamped with the current time.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        from_client_id: impl Into<String>,
        to_client_id: impl Into<String>,
        asset_id: impl Into<String>,
        amount: f64,
        overdraft_limit: f64,
        fee: Option<Fee>,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: now_millis(),
            from_client_id: from_client_id.into(),
            to_client_id: to_client_id.into(),
            asset_id: asset_id.into(),
            amount,
            overdraft_limit,
            fee,
        }
    }
}

wire_message! {
    /// Limit order placement. Negative volume sells.
    LimitOrder => LimitOrder {
        /// Correlation id, also the order id.
        id: String,
        /// Creation time, ms since the Unix epoch.
        timestamp: i64,
        /// Order owner.
        client_id: String,
        /// Asset pair identifier.
        asset_pair_id: String,
        /// Signed volume.
        volume: f64,
        /// Limit price.
        price: f64,
        /// Cancel the client's previous orders on this pair first.
        cancel_all_previous: bool,
        /// Optional fee.
        fee: Option<Fee>,
    }
}

impl LimitOrder {
    /// Creates a limit order stamped with the current time.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        client_id: impl Into<String>,
        asset_pair_id: impl Into<String>,
        volume: f64,
        price: f64,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: now_millis(),
            client_id: client_id.into(),
            asset_pair_id: asset_pair_id.into(),
            volume,
            price,
            cancel_all_previous: false,
            fee: None,
        }
    }

    /// Cancels previous orders on the pair before placing this one.
    #[must_use]
    pub fn cancel_all_previous(mut self, cancel: bool) -> Self {
        self.cancel_all_previous = cancel;
        self
    }

    /// Attaches a fee.
    #[must_use]
    pub fn with_fee(mut self, fee: Fee) -> Self {
        self.fee = Some(fee);
        self
    }
}

wire_message! {
    /// Market order keyed by a numeric id, answered with [`LegacyResponse`].
    LegacyMarketOrder => LegacyMarketOrder {
        /// Correlation id.
        id: i64,
        /// Creation time, ms since the Unix epoch.
        timestamp: i64,
        /// Order owner.
        client_id: String,
        /// Asset pair identifier.
        asset_pair_id: String,
        /// Signed volume.
        volume: f64,
        /// Volume is expressed in the base asset.
        straight: bool,
        /// Limit volume already reserved for this order.
        reserved_limit_volume: Option<f64>,
    }
}

impl LegacyMarketOrder {
    /// Creates a legacy market order stamped with the current time.
    #[must_use]
    pub fn new(
        id: i64,
        client_id: impl Into<String>,
        asset_pair_id: impl Into<String>,
        volume: f64,
        straight: bool,
        reserved_limit_volume: Option<f64>,
    ) -> Self {
        Self {
            id,
            timestamp: now_millis(),
            client_id: client_id.into(),
            asset_pair_id: asset_pair_id.into(),
            volume,
            straight,
            reserved_limit_volume,
        }
    }
}

wire_message! {
    /// Cancellation of a previously placed limit order.
    LimitOrderCancel => LimitOrderCancel {
        /// Correlation id.
        id: String,
        /// Order to cancel.
        limit_order_id: String,
    }
}

impl LimitOrderCancel {
    /// Creates a cancellation request.
    #[must_use]
    pub fn new(id: impl Into<String>, limit_order_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            limit_order_id: limit_order_id.into(),
        }
    }
}

wire_message! {
    /// Sets a client's balance for an asset.
    BalanceUpdate => BalanceUpdate {
        /// Correlation id.
        id: String,
        /// Client whose balance is set.
        client_id: String,
        /// Asset identifier.
        asset_id: String,
        /// New balance.
        amount: f64,
    }
}

impl BalanceUpdate {
    /// Creates a balance update.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        client_id: impl Into<String>,
        asset_id: impl Into<String>,
        amount: f64,
    ) -> Self {
        Self {
            id: id.into(),
            client_id: client_id.into(),
            asset_id: asset_id.into(),
            amount,
        }
    }
}

wire_message! {
    /// Atomic exchange of two assets between two clients.
    Swap => Swap {
        /// Correlation id.
        id: String,
        /// Creation time, ms since the Unix epoch.
        timestamp: i64,
        /// First client.
        client_id1: String,
        /// Asset given by the first client.
        asset_id1: String,
        /// Amount given by the first client.
        amount1: f64,
        /// Second client.
        client_id2: String,
        /// Asset given by the second client.
        asset_id2: String,
        /// Amount given by the second client.
        amount2: f64,
    }
}

impl Swap {
    /// Creates a swap stamped with the current time.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        client_id1: impl Into<String>,
        asset_id1: impl Into<String>,
        amount1: f64,
        client_id2: impl Into<String>,
        asset_id2: impl Into<String>,
        amount2: f64,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: now_millis(),
            client_id1: client_id1.into(),
            asset_id1: asset_id1.into(),
            amount1,
            client_id2: client_id2.into(),
            asset_id2: asset_id2.into(),
            amount2,
        }
    }
}

wire_message! {
    /// Market order keyed by a string id, answered with [`MarketOrderResponse`].
    MarketOrder => MarketOrder {
        /// Correlation id.
        id: String,
        /// Creation time, ms since the Unix epoch.
        timestamp: i64,
        /// Order owner.
        client_id: String,
        /// Asset pair identifier.
        asset_pair_id: String,
        /// Signed volume.
        volume: f64,
        /// Volume is expressed in the base asset.
        straight: bool,
        /// Limit volume already reserved for this order.
        reserved_limit_volume: Option<f64>,
        /// Optional fee.
        fee: Option<Fee>,
    }
}

impl MarketOrder {
    /// Creates a market order stamped with the current time.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        client_id: impl Into<String>,
        asset_pair_id: impl Into<String>,
        volume: f64,
        straight: bool,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp: now_millis(),
            client_id: client_id.into(),
            asset_pair_id: asset_pair_id.into(),
            volume,
            straight,
            reserved_limit_volume: None,
            fee: None,
        }
    }

    /// Sets the reserved limit volume.
    #[must_use]
    pub fn reserved_limit_volume(mut self, volume: f64) -> Self {
        self.reserved_limit_volume = Some(volume);
        self
    }

    /// Attaches a fee.
    #[must_use]
    pub fn with_fee(mut self, fee: Fee) -> Self {
        self.fee = Some(fee);
        self
    }
}

wire_message! {
    /// Generic response to every string-keyed request except market orders.
    NewResponse => NewResponse {
        /// Echo of the request id.
        id: String,
        /// Engine-side message id.
        message_id: Option<String>,
        /// Outcome.
        status: StatusCode,
        /// Human-readable reason for a non-OK status.
        status_reason: Option<String>,
        /// Settled amount, when the operation moves funds.
        amount: Option<f64>,
    }
}

impl NewResponse {
    /// Creates an OK response for `id`.
    #[must_use]
    pub fn ok(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            message_id: None,
            status: StatusCode::Ok,
            status_reason: None,
            amount: None,
        }
    }
}

wire_message! {
    /// Response to a [`MarketOrder`].
    MarketOrderResponse => MarketOrderResponse {
        /// Echo of the request id.
        id: String,
        /// Outcome.
        status: StatusCode,
        /// Human-readable reason for a non-OK status.
        status_reason: Option<String>,
        /// Average execution price.
        price: Option<f64>,
    }
}
