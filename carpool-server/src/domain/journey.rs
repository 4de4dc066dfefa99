//! Journeys: groups of passengers waiting for, or riding in, a car.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::car::CarId;
use super::error::PoolError;

/// Caller-assigned journey identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JourneyId(pub u32);

impl fmt::Debug for JourneyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JourneyId({})", self.0)
    }
}

impl fmt::Display for JourneyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<JourneyId> for u32 {
    fn from(id: JourneyId) -> Self {
        id.0
    }
}

/// A journey request.
///
/// `assigned_car` is `None` while the journey waits in the pending queue.
/// The car is referenced by id; its seat state lives in the car store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Journey {
    pub id: JourneyId,
    pub passengers: u32,
    pub assigned_car: Option<CarId>,
}

impl Journey {
    /// Create a new, unassigned journey.
    pub fn new(id: JourneyId, passengers: u32) -> Result<Self, PoolError> {
        if passengers == 0 {
            return Err(PoolError::InvalidInput(format!(
                "journey {id} has no passengers"
            )));
        }
        Ok(Self {
            id,
            passengers,
            assigned_car: None,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.assigned_car.is_none()
    }

    pub fn assign_to(&mut self, car: CarId) {
        self.assigned_car = Some(car);
    }
}
