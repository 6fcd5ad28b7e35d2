//! Single-resolution pending request table.
//!
//! One [`PendingTable`] exists per correlation namespace. Each registered key
//! owns a oneshot slot; the first resolution or cancellation removes the
//! entry and completes the slot, and every later attempt for the same key is
//! a no-op. Dropping a [`PendingHandle`] before it completes removes its slot.

use crate::error::ClientError;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt::Display;
use std::future::Future;
use std::hash::Hash;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

type Completion<V> = oneshot::Sender<Result<V, ClientError>>;
type Slots<K, V> = Arc<Mutex<HashMap<K, Slot<V>>>>;

struct Slot<V> {
    tx: Completion<V>,
    created_at: Instant,
    ticket: u64,
}

/// Concurrent key to pending-slot registry for one namespace.
pub struct PendingTable<K, V> {
    name: &'static str,
    slots: Slots<K, V>,
    next_ticket: AtomicU64,
}

impl<K, V> PendingTable<K, V>
where
    K: Eq + Hash + Clone + Display,
{
    /// Creates an empty table. `name` is only used in log fields.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Returns the namespace name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Registers a pending slot for `key`.
    ///
    /// A key whose previous waiter has already gone away counts as free and
    /// is replaced.
    ///
    /// # Errors
    /// Returns `DuplicateKey` if `key` already has a live waiter.
    pub fn register(&self, key: K) -> Result<PendingHandle<K, V>, ClientError> {
        let mut slots = self.slots.lock();
        if let Some(existing) = slots.get(&key) {
            if !existing.tx.is_closed() {
                return Err(ClientError::DuplicateKey {
                    key: key.to_string(),
                });
            }
            tracing::debug!(table = self.name, %key, "replacing abandoned pending slot");
        }

        let ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        slots.insert(
            key.clone(),
            Slot {
                tx,
                created_at: Instant::now(),
                ticket,
            },
        );
        Ok(PendingHandle {
            rx,
            slots: Arc::clone(&self.slots),
            key,
            ticket,
            done: false,
        })
    }

    /// Hands `value` to the waiter registered for `key`.
    ///
    /// Unknown keys (never registered, already resolved or cancelled) are
    /// ignored. Returns whether a slot was completed.
    pub fn resolve(&self, key: &K, value: V) -> bool {
        let Some(slot) = self.slots.lock().remove(key) else {
            tracing::trace!(table = self.name, %key, "no pending slot for response");
            return false;
        };
        // The waiter may have given up in the meantime; nothing to do then.
        let _ = slot.tx.send(Ok(value));
        true
    }

    /// Removes the slot for `key` and fails its waiter with `Cancelled`.
    ///
    /// Returns whether a slot was removed.
    pub fn cancel(&self, key: &K) -> bool {
        match self.slots.lock().remove(key) {
            Some(slot) => {
                let _ = slot.tx.send(Err(ClientError::Cancelled));
                true
            }
            None => false,
        }
    }

    /// Fails every pending slot with the error produced by `error`.
    ///
    /// Returns the number of slots failed.
    pub fn fail_all(&self, error: impl Fn() -> ClientError) -> usize {
        let drained: Vec<Slot<V>> = {
            let mut slots = self.slots.lock();
            slots.drain().map(|(_, slot)| slot).collect()
        };
        let count = drained.len();
        for slot in drained {
            let _ = slot.tx.send(Err(error()));
        }
        count
    }

    /// Returns the number of pending slots.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Returns how long the oldest pending slot has been waiting.
    #[must_use]
    pub fn oldest_age(&self) -> Option<Duration> {
        self.slots
            .lock()
            .values()
            .map(|slot| slot.created_at.elapsed())
            .max()
    }
}

/// Future resolving to the response for one registered key.
///
/// Resolves to `Err(Cancelled)` if the slot is dropped without being
/// completed. Dropping the handle before it resolves removes the slot, so a
/// caller that gives up leaves nothing behind in the table.
#[must_use = "a pending handle does nothing unless awaited"]
pub struct PendingHandle<K, V>
where
    K: Eq + Hash,
{
    rx: oneshot::Receiver<Result<V, ClientError>>,
    slots: Slots<K, V>,
    key: K,
    ticket: u64,
    done: bool,
}

// The key is never pinned; only the receiver is polled.
impl<K: Eq + Hash, V> Unpin for PendingHandle<K, V> {}

impl<K: Eq + Hash, V> Future for PendingHandle<K, V> {
    type Output = Result<V, ClientError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let polled = Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(ClientError::Cancelled)));
        if polled.is_ready() {
            self.done = true;
        }
        polled
    }
}

impl<K: Eq + Hash, V> Drop for PendingHandle<K, V> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut slots = self.slots.lock();
        // Only our own slot: the key may have been resolved and registered
        // again by another caller since.
        if slots
            .get(&self.key)
            .is_some_and(|slot| slot.ticket == self.ticket)
        {
            slots.remove(&self.key);
        }
    }
}
