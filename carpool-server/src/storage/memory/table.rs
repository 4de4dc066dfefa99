//! Id-keyed in-memory collections for cars and journeys.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::RwLock;

use crate::domain::{Car, CarId, EntityKind, Journey, JourneyId, PoolError};
use crate::storage::EntityStore;

/// An entity that can be stored by its own id.
pub trait Keyed: Clone {
    type Key: Copy + Ord + Into<u32>;

    const KIND: EntityKind;

    fn key(&self) -> Self::Key;
}

impl Keyed for Car {
    type Key = CarId;

    const KIND: EntityKind = EntityKind::Car;

    fn key(&self) -> CarId {
        self.id
    }
}

impl Keyed for Journey {
    type Key = JourneyId;

    const KIND: EntityKind = EntityKind::Journey;

    fn key(&self) -> JourneyId {
        self.id
    }
}

/// A lock-guarded map from id to entity.
///
/// Each call takes the lock once, so individual operations are atomic.
/// Grouping operations atomically is the transaction's job.
pub struct MemoryTable<V: Keyed> {
    rows: RwLock<BTreeMap<V::Key, V>>,
}

impl<V: Keyed> fmt::Debug for MemoryTable<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTable")
            .field("kind", &V::KIND)
            .field("rows", &self.len())
            .finish()
    }
}

impl<V: Keyed> Default for MemoryTable<V> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }
}

impl<V: Keyed> MemoryTable<V> {
    /// Clone the full contents.
    pub(super) fn snapshot(&self) -> BTreeMap<V::Key, V> {
        self.rows.read().clone()
    }

    /// Overwrite the full contents.
    pub(super) fn restore(&self, rows: BTreeMap<V::Key, V>) {
        *self.rows.write() = rows;
    }

    pub fn len(&self) -> usize {
        self.rows.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.read().is_empty()
    }
}

impl<V: Keyed> EntityStore for MemoryTable<V> {
    type Id = V::Key;
    type Entity = V;

    fn insert(&self, entity: V) -> Result<(), PoolError> {
        let mut rows = self.rows.write();
        let key = entity.key();
        if rows.contains_key(&key) {
            return Err(PoolError::conflict(V::KIND, key));
        }
        rows.insert(key, entity);
        Ok(())
    }

    fn find_by_id(&self, id: V::Key) -> Result<V, PoolError> {
        self.rows
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| PoolError::not_found(V::KIND, id))
    }

    fn update(&self, id: V::Key, entity: V) -> Result<(), PoolError> {
        let mut rows = self.rows.write();
        let slot = rows
            .get_mut(&id)
            .ok_or_else(|| PoolError::not_found(V::KIND, id))?;
        *slot = entity;
        Ok(())
    }

    fn delete_by_id(&self, id: V::Key) -> Result<V, PoolError> {
        self.rows
            .write()
            .remove(&id)
            .ok_or_else(|| PoolError::not_found(V::KIND, id))
    }

    fn list_all(&self) -> Result<Vec<V>, PoolError> {
        Ok(self.rows.read().values().cloned().collect())
    }

    fn reset_all(&self) -> Result<(), PoolError> {
        self.rows.write().clear();
        Ok(())
    }
}
