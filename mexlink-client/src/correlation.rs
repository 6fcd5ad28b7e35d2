//! Correlation tables, one per key namespace, and inbound response routing.

use crate::error::ClientError;
use crate::pending::PendingTable;
use mexlink_core::{LegacyResponse, MarketOrderResponse, Message, MessageType, NewResponse};
use std::time::Duration;

/// Outcome of routing one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// A waiting request was completed.
    Delivered,
    /// A response whose key has no pending request (late, duplicate or
    /// stray).
    Unmatched,
    /// A keep-alive.
    KeepAlive,
    /// A request-kind message, which the engine is not expected to send.
    Unexpected(MessageType),
}

/// The three correlation namespaces.
///
/// Keys from different namespaces live in different tables, so a legacy
/// numeric id can never complete a string-keyed request and a market order
/// id can never complete a generic one.
pub struct CorrelationTables {
    /// Legacy market orders, keyed by numeric id.
    pub legacy: PendingTable<i64, LegacyResponse>,
    /// Generic string-keyed requests answered by [`NewResponse`].
    pub generic: PendingTable<String, NewResponse>,
    /// Market orders, keyed by string id.
    pub market: PendingTable<String, MarketOrderResponse>,
}

impl Default for CorrelationTables {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelationTables {
    /// Creates three empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self {
            legacy: PendingTable::new("legacy"),
            generic: PendingTable::new("generic"),
            market: PendingTable::new("market"),
        }
    }

    /// Routes an inbound message to the table matching its namespace.
    pub fn route(&self, message: Message) -> Routed {
        let delivered = match message {
            Message::LegacyResponse(response) => {
                let key = response.process_id;
                self.legacy.resolve(&key, response)
            }
            Message::NewResponse(response) => {
                let key = response.id.clone();
                self.generic.resolve(&key, response)
            }
            Message::MarketOrderResponse(response) => {
                let key = response.id.clone();
                self.market.resolve(&key, response)
            }
            Message::Ping(_) => return Routed::KeepAlive,
            other => return Routed::Unexpected(other.message_type()),
        };

        if delivered {
            Routed::Delivered
        } else {
            Routed::Unmatched
        }
    }

    /// Fails every pending request in every namespace.
    ///
    /// Returns the number of requests failed.
    pub fn fail_all(&self, error: impl Fn() -> ClientError) -> usize {
        self.legacy.fail_all(&error) + self.generic.fail_all(&error) + self.market.fail_all(&error)
    }

    /// Returns how long the oldest pending request in any namespace has
    /// been waiting.
    #[must_use]
    pub fn oldest_age(&self) -> Option<Duration> {
        [
            self.legacy.oldest_age(),
            self.generic.oldest_age(),
            self.market.oldest_age(),
        ]
        .into_iter()
        .flatten()
        .max()
    }

    /// Returns the number of pending requests across all namespaces.
    #[must_use]
    pub fn pending_total(&self) -> usize {
        self.legacy.pending_count() + self.generic.pending_count() + self.market.pending_count()
    }
}
