//! The pending queue: journeys waiting for a car, in arrival order.

use parking_lot::RwLock;

use crate::domain::{EntityKind, Journey, JourneyId, PoolError};
use crate::storage::EntityStore;

/// Arrival-ordered list of pending journeys.
///
/// Lookups are linear scans. The queue only holds journeys nobody could
/// seat yet, which stays small next to the fleet.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    entries: RwLock<Vec<Journey>>,
}

impl MemoryQueue {
    pub(super) fn snapshot(&self) -> Vec<Journey> {
        self.entries.read().clone()
    }

    pub(super) fn restore(&self, entries: Vec<Journey>) {
        *self.entries.write() = entries;
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl EntityStore for MemoryQueue {
    type Id = JourneyId;
    type Entity = Journey;

    /// Append at the tail.
    fn insert(&self, journey: Journey) -> Result<(), PoolError> {
        let mut entries = self.entries.write();
        if entries.iter().any(|p| p.id == journey.id) {
            return Err(PoolError::conflict(EntityKind::Pending, journey.id));
        }
        entries.push(journey);
        Ok(())
    }

    fn find_by_id(&self, id: JourneyId) -> Result<Journey, PoolError> {
        self.entries
            .read()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| PoolError::not_found(EntityKind::Pending, id))
    }

    /// Replace an entry without moving it in the queue.
    fn update(&self, id: JourneyId, journey: Journey) -> Result<(), PoolError> {
        let mut entries = self.entries.write();
        let slot = entries
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| PoolError::not_found(EntityKind::Pending, id))?;
        *slot = journey;
        Ok(())
    }

    fn delete_by_id(&self, id: JourneyId) -> Result<Journey, PoolError> {
        let mut entries = self.entries.write();
        let pos = entries
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| PoolError::not_found(EntityKind::Pending, id))?;
        Ok(entries.remove(pos))
    }

    fn list_all(&self) -> Result<Vec<Journey>, PoolError> {
        Ok(self.entries.read().clone())
    }

    fn reset_all(&self) -> Result<(), PoolError> {
        self.entries.write().clear();
        Ok(())
    }
}
