//! Snapshot transactions over the in-memory store.

use parking_lot::MutexGuard;
use tracing::{debug, trace};

use crate::domain::{Car, Journey, PoolError};
use crate::storage::Transaction;

use super::queue::MemoryQueue;
use super::table::MemoryTable;
use super::{MemoryStore, StoreSnapshot};

/// A transaction over a [`MemoryStore`].
///
/// Holds the store's writer gate for its whole lifetime, so at most one
/// transaction runs at a time and a rollback can only ever undo its own
/// writes. Writes go straight to the live collections; the snapshot taken
/// at `begin` is what `rollback` restores. The snapshot is kept until
/// commit, so writes made after an explicit rollback are still undone when
/// the transaction is dropped.
pub struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    snapshot: Option<StoreSnapshot>,
    committed: bool,
    rolled_back: bool,
    _writer: MutexGuard<'a, ()>,
}

impl<'a> MemoryTransaction<'a> {
    pub(super) fn new(store: &'a MemoryStore, writer: MutexGuard<'a, ()>) -> Self {
        let snapshot = store.capture();
        trace!(
            cars = snapshot.cars.len(),
            journeys = snapshot.journeys.len(),
            pending = snapshot.pending.len(),
            "transaction started"
        );
        Self {
            store,
            snapshot: Some(snapshot),
            committed: false,
            rolled_back: false,
            _writer: writer,
        }
    }
}

impl Transaction for MemoryTransaction<'_> {
    type Cars = MemoryTable<Car>;
    type Journeys = MemoryTable<Journey>;
    type Pending = MemoryQueue;

    fn cars(&self) -> &MemoryTable<Car> {
        &self.store.cars
    }

    fn journeys(&self) -> &MemoryTable<Journey> {
        &self.store.journeys
    }

    fn pending(&self) -> &MemoryQueue {
        &self.store.pending
    }

    fn commit(&mut self) -> Result<(), PoolError> {
        if self.rolled_back {
            return Err(PoolError::StorageUnavailable(
                "transaction already rolled back".to_string(),
            ));
        }
        self.snapshot = None;
        self.committed = true;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), PoolError> {
        if self.committed {
            return Ok(());
        }
        if let Some(snapshot) = &self.snapshot {
            self.store.restore(snapshot.clone());
            debug!("transaction rolled back");
        }
        self.rolled_back = true;
        Ok(())
    }

    fn has_committed(&self) -> bool {
        self.committed
    }
}

impl Drop for MemoryTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            // In-memory rollback cannot fail.
            let _ = self.rollback();
        }
    }
}
