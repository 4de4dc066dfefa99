//! Storage contract for cars, journeys and the pending queue.
//!
//! The allocation engine only talks to these traits, so a different backend
//! can be dropped in without touching allocation logic. The in-memory
//! backend in [`memory`] is the only one shipped.

pub mod memory;

use std::fmt;
use std::str::FromStr;

use crate::domain::{Car, CarId, Journey, JourneyId, PoolError};

pub use memory::{MemoryStore, MemoryTransaction, StoreSnapshot};

/// CRUD operations over one collection.
///
/// Every backend follows the same policy for all collections:
/// - `insert` fails with `Conflict` if the id is already stored
/// - `find_by_id`, `update` and `delete_by_id` fail with `NotFound` if it isn't
/// - `list_all` returns cars and journeys by ascending id, pending journeys
///   in arrival order
pub trait EntityStore {
    type Id: Copy;
    type Entity: Clone;

    fn insert(&self, entity: Self::Entity) -> Result<(), PoolError>;

    fn find_by_id(&self, id: Self::Id) -> Result<Self::Entity, PoolError>;

    /// Replace the stored value in place.
    fn update(&self, id: Self::Id, entity: Self::Entity) -> Result<(), PoolError>;

    /// Remove an entity, returning what was stored.
    fn delete_by_id(&self, id: Self::Id) -> Result<Self::Entity, PoolError>;

    fn list_all(&self) -> Result<Vec<Self::Entity>, PoolError>;

    /// Empty the collection. Only fleet resets do this.
    fn reset_all(&self) -> Result<(), PoolError>;
}

/// An open unit of work over the three collections.
///
/// Writes through the accessors are visible immediately to later reads in
/// the same transaction. A transaction that is dropped without `commit`
/// is rolled back.
pub trait Transaction {
    type Cars: EntityStore<Id = CarId, Entity = Car>;
    type Journeys: EntityStore<Id = JourneyId, Entity = Journey>;
    type Pending: EntityStore<Id = JourneyId, Entity = Journey>;

    fn cars(&self) -> &Self::Cars;

    fn journeys(&self) -> &Self::Journeys;

    fn pending(&self) -> &Self::Pending;

    /// Make the transaction's writes permanent. Idempotent.
    ///
    /// Fails once the transaction has been rolled back.
    fn commit(&mut self) -> Result<(), PoolError>;

    /// Restore every collection to its state at `begin`.
    ///
    /// A no-op once the transaction has committed. Calling it again after a
    /// rollback restores the `begin` state again.
    fn rollback(&mut self) -> Result<(), PoolError>;

    fn has_committed(&self) -> bool;
}

/// Starts transactions against a backend.
pub trait TransactionFactory: Send + Sync {
    type Transaction<'a>: Transaction
    where
        Self: 'a;

    fn begin(&self) -> Result<Self::Transaction<'_>, PoolError>;
}

/// Storage backend selected at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageKind {
    #[default]
    Memory,
}

/// Returned when a backend name isn't recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown storage backend: {0}")]
pub struct UnknownStorageKind(String);

impl FromStr for StorageKind {
    type Err = UnknownStorageKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageKind::Memory),
            _ => Err(UnknownStorageKind(s.to_string())),
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Memory => f.write_str("memory"),
        }
    }
}
