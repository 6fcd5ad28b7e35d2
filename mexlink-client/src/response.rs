//! Caller-facing results.

use mexlink_core::{MarketOrderResponse, NewResponse, StatusCode};

/// Result of a generic engine operation.
#[derive(Debug, Clone, PartialEq)]
pub struct MeResponse {
    /// Request id the engine answered.
    pub id: String,
    /// Engine-side message id, when the engine reports one.
    pub message_id: Option<String>,
    /// Engine status.
    pub status: StatusCode,
    /// Human-readable reason for a non-OK status.
    pub status_reason: Option<String>,
    /// Resulting amount, for operations that report one.
    pub amount: Option<f64>,
}

impl MeResponse {
    /// Returns true if the engine accepted the request.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

impl From<NewResponse> for MeResponse {
    fn from(response: NewResponse) -> Self {
        Self {
            id: response.id,
            message_id: response.message_id,
            status: response.status,
            status_reason: response.status_reason,
            amount: response.amount,
        }
    }
}

/// Result of a market order.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketOrderResult {
    /// Order id.
    pub id: String,
    /// Engine status.
    pub status: StatusCode,
    /// Human-readable reason for a non-OK status.
    pub status_reason: Option<String>,
    /// Execution price, when the order matched.
    pub price: Option<f64>,
}

impl MarketOrderResult {
    /// Returns true if the engine accepted the order.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status.is_ok()
    }
}

impl From<MarketOrderResponse> for MarketOrderResult {
    fn from(response: MarketOrderResponse) -> Self {
        Self {
            id: response.id,
            status: response.status,
            status_reason: response.status_reason,
            price: response.price,
        }
    }
}
