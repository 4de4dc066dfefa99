//! Error types shared by the store, the allocation engine and the service.
//!
//! The web layer maps each variant to an HTTP status; everything below it
//! only ever deals in these four kinds.

use std::fmt;

/// The collection an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Car,
    Journey,
    Pending,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EntityKind::Car => "car",
            EntityKind::Journey => "journey",
            EntityKind::Pending => "pending journey",
        })
    }
}

/// Errors produced by car pool operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    /// Referenced car or journey does not exist
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: u32 },

    /// Duplicate id, either within a batch or against stored entities
    #[error("duplicate {kind} id {id}")]
    Conflict { kind: EntityKind, id: u32 },

    /// Seat count out of range, zero passengers, or otherwise malformed data
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The backend could not begin, run or commit a transaction
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl PoolError {
    pub fn not_found(kind: EntityKind, id: impl Into<u32>) -> Self {
        PoolError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn conflict(kind: EntityKind, id: impl Into<u32>) -> Self {
        PoolError::Conflict {
            kind,
            id: id.into(),
        }
    }

    /// Returns true for `NotFound`, regardless of kind.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PoolError::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = PoolError::not_found(EntityKind::Journey, 7u32);
        assert_eq!(err.to_string(), "journey 7 not found");

        let err = PoolError::conflict(EntityKind::Car, 3u32);
        assert_eq!(err.to_string(), "duplicate car id 3");

        let err = PoolError::not_found(EntityKind::Pending, 2u32);
        assert_eq!(err.to_string(), "pending journey 2 not found");

        let err = PoolError::InvalidInput("car 1 has 9 seats".into());
        assert_eq!(err.to_string(), "invalid input: car 1 has 9 seats");

        let err = PoolError::StorageUnavailable("backend offline".into());
        assert_eq!(err.to_string(), "storage unavailable: backend offline");
    }

    #[test]
    fn not_found_predicate() {
        assert!(PoolError::not_found(EntityKind::Car, 1u32).is_not_found());
        assert!(!PoolError::conflict(EntityKind::Car, 1u32).is_not_found());
    }
}
