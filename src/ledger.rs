//! Persistent order ledger.
//!
//! All orders live in one JSON list under [`ORDERS_KEY`]. Every mutation is
//! a read/modify/write of that list done under a single lock, and publishes
//! a [`LedgerEvent`] once the write has committed.

use crate::models::SavedOrder;
use crate::storage::{KeyValueStore, StorageError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{debug, warn};


/// Store key holding the encoded order list.
pub const ORDERS_KEY: &str = "orders.v1";

/// Ledger error types.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The backing store failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// The order list could not be encoded.
    #[error("ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Committed ledger change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// A new order was saved.
    Appended(SavedOrder),
    /// An existing order changed.
    Updated(SavedOrder),
    /// An order was removed.
    Removed(String),
    /// The ledger was emptied; carries the number of orders dropped.
    Cleared(usize),
}

/// Order ledger over a key-value store.
pub struct OrderLedger {
    store: Arc<dyn KeyValueStore>,
    lock: Mutex<()>,
    event_tx: broadcast::Sender<LedgerEvent>,
}

impl OrderLedger {
    /// Creates a ledger persisting into `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        Self {
            store,
            lock: Mutex::new(()),
            event_tx,
        }
    }

    /// Subscribes to committed changes.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.event_tx.subscribe()
    }

    /// All orders in insertion order.
    ///
    /// # Errors
    /// Returns error if the store cannot be read.
    pub fn load(&self) -> Result<Vec<SavedOrder>, LedgerError> {
        let _guard = self.lock.lock();
        self.read()
    }

    /// Order with `id`.
    ///
    /// # Errors
    /// Returns error if the store cannot be read.
    pub fn get(&self, id: &str) -> Result<Option<SavedOrder>, LedgerError> {
        Ok(self.load()?.into_iter().find(|o| o.id == id))
    }

    /// Orders still awaiting a fill.
    ///
    /// # Errors
    /// Returns error if the store cannot be read.
    pub fn working(&self) -> Result<Vec<SavedOrder>, LedgerError> {
        Ok(self
            .load()?
            .into_iter()
            .filter(|o| !o.status.is_terminal())
            .collect())
    }

    /// Saves `order`, replacing any order with the same id in place.
    ///
    /// An order already in a terminal status is never replaced. Returns
    /// whether the order was written.
    ///
    /// # Errors
    /// Returns error if the list cannot be written.
    pub fn append(&self, order: SavedOrder) -> Result<bool, LedgerError> {
        let _guard = self.lock.lock();
        let mut orders = self.read()?;

        let event = match orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) if existing.status.is_terminal() => {
                warn!(
                    order_id = %order.id,
                    status = %existing.status,
                    "refusing to replace terminal order"
                );
                return Ok(false);
            }
            Some(existing) => {
                *existing = order.clone();
                LedgerEvent::Updated(order)
            }
            None => {
                orders.push(order.clone());
                LedgerEvent::Appended(order)
            }
        };
        self.write(&orders)?;
        self.publish(event);
        Ok(true)
    }

    /// Applies `mutator` to the order with `id`.
    ///
    /// Orders in a terminal status are left alone. The id cannot be changed.
    /// Returns whether a change was committed.
    ///
    /// # Errors
    /// Returns error if the list cannot be read or written.
    pub fn update<F>(&self, id: &str, mutator: F) -> Result<bool, LedgerError>
    where
        F: FnOnce(&mut SavedOrder),
    {
        let _guard = self.lock.lock();
        let mut orders = self.read()?;

        let Some(order) = orders.iter_mut().find(|o| o.id == id) else {
            debug!(order_id = id, "update of unknown order ignored");
            return Ok(false);
        };
        if order.status.is_terminal() {
            debug!(order_id = id, status = %order.status, "update of terminal order ignored");
            return Ok(false);
        }

        let before = order.clone();
        mutator(order);
        order.id = before.id.clone();
        if *order == before {
            return Ok(false);
        }

        let updated = order.clone();
        self.write(&orders)?;
        self.publish(LedgerEvent::Updated(updated));
        Ok(true)
    }

    /// Removes the order with `id`. Returns whether it existed.
    ///
    /// # Errors
    /// Returns error if the list cannot be read or written.
    pub fn remove(&self, id: &str) -> Result<bool, LedgerError> {
        let _guard = self.lock.lock();
        let mut orders = self.read()?;
        let before = orders.len();
        orders.retain(|o| o.id != id);
        if orders.len() == before {
            return Ok(false);
        }

        self.write(&orders)?;
        self.publish(LedgerEvent::Removed(id.to_string()));
        Ok(true)
    }

    /// Drops every order. Returns how many were removed.
    ///
    /// # Errors
    /// Returns error if the store cannot be written.
    pub fn clear(&self) -> Result<usize, LedgerError> {
        let _guard = self.lock.lock();
        let removed = self.read()?.len();
        self.store.delete(ORDERS_KEY)?;
        self.publish(LedgerEvent::Cleared(removed));
        Ok(removed)
    }

    fn read(&self) -> Result<Vec<SavedOrder>, LedgerError> {
        let Some(raw) = self.store.get(ORDERS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(orders) => Ok(orders),
            Err(e) => {
                warn!(error = %e, "stored order list is corrupt, treating ledger as empty");
                Ok(Vec::new())
            }
        }
    }

    fn write(&self, orders: &[SavedOrder]) -> Result<(), LedgerError> {
        let raw = serde_json::to_string(orders)?;
        self.store.put(ORDERS_KEY, raw)?;
        Ok(())
    }

    fn publish(&self, event: LedgerEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }
}

impl std::fmt::Debug for OrderLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderLedger")
            .field("subscribers", &self.event_tx.receiver_count())
            .finish_non_exhaustive()
    }
}
