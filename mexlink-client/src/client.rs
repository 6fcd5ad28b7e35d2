//! The matching-engine client facade.
//!
//! Every operation follows the same path: encode the request, register its
//! key in the namespace's pending table, write the frame through the current
//! session, then wait for the matching response. A request larger than the
//! configured max frame size is rejected before it is registered; the engine
//! treats one as a connection-level error. A failed send always
//! cancels the slot before the error is returned, and a caller that stops
//! waiting releases its slot when its future is dropped, so no key is left
//! behind.

use crate::connection::ConnectionManager;
use crate::correlation::CorrelationTables;
use crate::error::ClientError;
use crate::pending::PendingTable;
use crate::response::{MarketOrderResult, MeResponse};
use crate::stats::{ConnectionStats, SocketStatistics};
use mexlink_core::{
    BalanceUpdate, CashInOut, Fee, FeeSizeType, FrameHeader, LegacyMarketOrder, LimitOrder,
    LimitOrderCancel, MarketOrder, Message, OrderAction, Swap, Transfer,
};
use mexlink_transport::TransportError;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

/// Client for one matching engine, multiplexing every request over a single
/// reconnecting connection.
///
/// Build one with [`ClientBuilder`](crate::ClientBuilder), then call
/// [`start`](Self::start) from inside a tokio runtime.
pub struct MatchingEngineClient {
    manager: Arc<ConnectionManager>,
    tables: Arc<CorrelationTables>,
    stats: Arc<ConnectionStats>,
    request_timeout: Option<Duration>,
    max_frame_size: usize,
    next_legacy_id: AtomicI64,
}

impl MatchingEngineClient {
    pub(crate) fn new(
        manager: Arc<ConnectionManager>,
        tables: Arc<CorrelationTables>,
        stats: Arc<ConnectionStats>,
        request_timeout: Option<Duration>,
        max_frame_size: usize,
    ) -> Self {
        Self {
            manager,
            tables,
            stats,
            request_timeout,
            max_frame_size,
            next_legacy_id: AtomicI64::new(1),
        }
    }

    /// Starts the background connection loop.
    pub fn start(&self) {
        self.manager.start();
    }

    /// Returns whether a session is currently live.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Returns a snapshot of the connection counters.
    #[must_use]
    pub fn socket_statistics(&self) -> SocketStatistics {
        self.stats.snapshot()
    }

    /// Returns the number of requests waiting for a response.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.tables.pending_total()
    }

    /// Stops reconnecting, closes the connection and fails every pending
    /// request with `Shutdown`.
    pub async fn shutdown(&self) {
        self.manager.shutdown().await;
    }

    /// Sets a client's balance for an asset.
    ///
    /// # Errors
    /// See [`ClientError`]; engine rejections come back as a non-OK status.
    pub async fn update_balance(
        &self,
        id: impl Into<String>,
        client_id: impl Into<String>,
        asset_id: impl Into<String>,
        amount: f64,
    ) -> Result<MeResponse, ClientError> {
        let request = BalanceUpdate::new(id, client_id, asset_id, amount);
        self.generic(request.id.clone(), request.into()).await
    }

    /// Deposits (positive amount) or withdraws (negative amount) cash.
    ///
    /// # Errors
    /// See [`ClientError`].
    pub async fn cash_in_out(
        &self,
        id: impl Into<String>,
        client_id: impl Into<String>,
        asset_id: impl Into<String>,
        amount: f64,
    ) -> Result<MeResponse, ClientError> {
        let request = CashInOut::new(id, client_id, asset_id, amount, None);
        self.generic(request.id.clone(), request.into()).await
    }

    /// Cash operation with a client fee paid to `fee_client_id`.
    ///
    /// # Errors
    /// See [`ClientError`].
    #[allow(clippy::too_many_arguments)]
    pub async fn cash_in_out_with_fee(
        &self,
        id: impl Into<String>,
        client_id: impl Into<String>,
        asset_id: impl Into<String>,
        amount: f64,
        fee_client_id: impl Into<String>,
        fee_size: f64,
        fee_size_type: FeeSizeType,
    ) -> Result<MeResponse, ClientError> {
        let fee = Fee::client(fee_client_id, fee_size, fee_size_type);
        let request = CashInOut::new(id, client_id, asset_id, amount, Some(fee));
        self.generic(request.id.clone(), request.into()).await
    }

    /// Transfers an asset between two clients.
    ///
    /// # Errors
    /// See [`ClientError`].
    #[allow(clippy::too_many_arguments)]
    pub async fn transfer(
        &self,
        id: impl Into<String>,
        from_client_id: impl Into<String>,
        to_client_id: impl Into<String>,
        asset_id: impl Into<String>,
        amount: f64,
        overdraft_limit: f64,
        fee: Option<Fee>,
    ) -> Result<MeResponse, ClientError> {
        let request = Transfer::new(
            id,
            from_client_id,
            to_client_id,
            asset_id,
            amount,
            overdraft_limit,
            fee,
        );
        self.generic(request.id.clone(), request.into()).await
    }

    /// Swaps two assets between two clients.
    ///
    /// # Errors
    /// See [`ClientError`].
    #[allow(clippy::too_many_arguments)]
    pub async fn swap(
        &self,
        id: impl Into<String>,
        client_id1: impl Into<String>,
        asset_id1: impl Into<String>,
        amount1: f64,
        client_id2: impl Into<String>,
        asset_id2: impl Into<String>,
        amount2: f64,
    ) -> Result<MeResponse, ClientError> {
        let request = Swap::new(
            id, client_id1, asset_id1, amount1, client_id2, asset_id2, amount2,
        );
        self.generic(request.id.clone(), request.into()).await
    }

    /// Places a limit order. The order id is the correlation key.
    ///
    /// # Errors
    /// See [`ClientError`].
    pub async fn place_limit_order(&self, order: LimitOrder) -> Result<MeResponse, ClientError> {
        self.generic(order.id.clone(), order.into()).await
    }

    /// Cancels a limit order. The request gets a fresh random id.
    ///
    /// # Errors
    /// See [`ClientError`].
    pub async fn cancel_limit_order(
        &self,
        limit_order_id: impl Into<String>,
    ) -> Result<MeResponse, ClientError> {
        let request = LimitOrderCancel::new(uuid::Uuid::new_v4().to_string(), limit_order_id);
        self.generic(request.id.clone(), request.into()).await
    }

    /// Sends a market order keyed by a numeric id and returns the id of the
    /// record the engine created.
    ///
    /// The id comes from a per-client counter starting at 1. `action`
    /// decides the sign of the volume.
    ///
    /// # Errors
    /// See [`ClientError`].
    pub async fn handle_market_order_legacy(
        &self,
        client_id: impl Into<String>,
        asset_pair_id: impl Into<String>,
        action: OrderAction,
        volume: f64,
        straight: bool,
        reserved_limit_volume: Option<f64>,
    ) -> Result<Option<String>, ClientError> {
        let id = self.next_legacy_id.fetch_add(1, Ordering::Relaxed);
        let request = LegacyMarketOrder::new(
            id,
            client_id,
            asset_pair_id,
            action.signed_volume(volume),
            straight,
            reserved_limit_volume,
        );
        let response = self.execute(&self.tables.legacy, id, request.into()).await?;
        Ok(response.record_id)
    }

    /// Sends a market order. The order id is the correlation key.
    ///
    /// # Errors
    /// See [`ClientError`].
    pub async fn handle_market_order(
        &self,
        order: MarketOrder,
    ) -> Result<MarketOrderResult, ClientError> {
        let key = order.id.clone();
        let response = self.execute(&self.tables.market, key, order.into()).await?;
        Ok(response.into())
    }

    async fn generic(&self, key: String, message: Message) -> Result<MeResponse, ClientError> {
        let response = self.execute(&self.tables.generic, key, message).await?;
        Ok(response.into())
    }

    async fn execute<K, V>(
        &self,
        table: &PendingTable<K, V>,
        key: K,
        message: Message,
    ) -> Result<V, ClientError>
    where
        K: Eq + Hash + Clone + Display,
    {
        if self.manager.is_shut_down() {
            return Err(ClientError::Shutdown);
        }

        let frame = message.to_bytes()?;
        let length = frame.len() - FrameHeader::LENGTH_PREFIX;
        if length > self.max_frame_size {
            tracing::debug!(
                table = table.name(),
                %key,
                length,
                max = self.max_frame_size,
                "request exceeds max frame size"
            );
            return Err(TransportError::frame_too_large(length, self.max_frame_size).into());
        }
        let handle = table.register(key.clone())?;

        let sent = match self.manager.current_session() {
            Some(session) => session.send(frame).await,
            None => Err(ClientError::NotConnected),
        };
        if let Err(e) = sent {
            table.cancel(&key);
            tracing::debug!(table = table.name(), %key, error = %e, "send failed");
            return Err(e);
        }
        tracing::trace!(table = table.name(), %key, kind = ?message.message_type(), "request sent");

        match self.request_timeout {
            None => handle.await,
            Some(limit) => match tokio::time::timeout(limit, handle).await {
                Ok(result) => result,
                Err(_) => {
                    // The expired handle was dropped with the timeout,
                    // which already removed its slot.
                    tracing::warn!(table = table.name(), %key, ?limit, "request timed out");
                    Err(ClientError::Timeout)
                }
            },
        }
    }
}
