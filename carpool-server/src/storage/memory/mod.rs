//! In-memory storage backend.
//!
//! State lives for the lifetime of the process only.

mod queue;
mod table;
mod transaction;

use std::collections::BTreeMap;

use parking_lot::Mutex;

use crate::domain::{Car, CarId, Journey, JourneyId, PoolError};

use super::TransactionFactory;

pub use queue::MemoryQueue;
pub use table::{Keyed, MemoryTable};
pub use transaction::MemoryTransaction;

/// Point-in-time copy of every collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreSnapshot {
    pub cars: BTreeMap<CarId, Car>,
    pub journeys: BTreeMap<JourneyId, Journey>,
    pub pending: Vec<Journey>,
}

/// The process-wide store: cars, journeys and the pending queue.
///
/// Each collection has its own lock. The `writer` gate is held by every
/// open transaction, serializing them.
#[derive(Debug, Default)]
pub struct MemoryStore {
    cars: MemoryTable<Car>,
    journeys: MemoryTable<Journey>,
    pending: MemoryQueue,
    writer: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy the committed state of the store.
    ///
    /// Waits for any open transaction to finish. Calling this while the
    /// current thread holds a transaction deadlocks.
    pub fn dump(&self) -> StoreSnapshot {
        let _writer = self.writer.lock();
        self.capture()
    }

    fn capture(&self) -> StoreSnapshot {
        StoreSnapshot {
            cars: self.cars.snapshot(),
            journeys: self.journeys.snapshot(),
            pending: self.pending.snapshot(),
        }
    }

    fn restore(&self, snapshot: StoreSnapshot) {
        self.cars.restore(snapshot.cars);
        self.journeys.restore(snapshot.journeys);
        self.pending.restore(snapshot.pending);
    }
}

impl TransactionFactory for MemoryStore {
    type Transaction<'a> = MemoryTransaction<'a>;

    /// Never fails for the in-memory backend.
    fn begin(&self) -> Result<MemoryTransaction<'_>, PoolError> {
        let writer = self.writer.lock();
        Ok(MemoryTransaction::new(self, writer))
    }
}
