//! Cars and their seat accounting.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::PoolError;

/// Smallest car the fleet accepts.
pub const MIN_SEATS: u32 = 4;

/// Largest car the fleet accepts.
pub const MAX_SEATS: u32 = 6;

/// Caller-assigned car identifier.
///
/// Ordered so that stores iterate cars deterministically and best-fit
/// ties resolve to the lowest id.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CarId(pub u32);

impl fmt::Debug for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CarId({})", self.0)
    }
}

impl fmt::Display for CarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CarId> for u32 {
    fn from(id: CarId) -> Self {
        id.0
    }
}

/// A car in the fleet.
///
/// `available_seats` never exceeds `total_seats`; the seat methods refuse
/// any change that would break that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Car {
    pub id: CarId,
    pub total_seats: u32,
    pub available_seats: u32,
}

impl Car {
    /// Create an empty car, validating its size.
    pub fn new(id: CarId, total_seats: u32) -> Result<Self, PoolError> {
        if !(MIN_SEATS..=MAX_SEATS).contains(&total_seats) {
            return Err(PoolError::InvalidInput(format!(
                "car {id} has {total_seats} seats, expected {MIN_SEATS} to {MAX_SEATS}"
            )));
        }
        Ok(Self {
            id,
            total_seats,
            available_seats: total_seats,
        })
    }

    /// Seats currently taken by assigned journeys.
    pub fn occupied_seats(&self) -> u32 {
        self.total_seats - self.available_seats
    }

    /// Whether a group of `passengers` fits right now.
    pub fn fits(&self, passengers: u32) -> bool {
        self.available_seats >= passengers
    }

    /// Seat `passengers` people.
    pub fn take_seats(&mut self, passengers: u32) -> Result<(), PoolError> {
        if !self.fits(passengers) {
            return Err(PoolError::InvalidInput(format!(
                "car {} has {} free seats, cannot take {passengers}",
                self.id, self.available_seats
            )));
        }
        self.available_seats -= passengers;
        Ok(())
    }

    /// Release seats after a dropoff.
    pub fn free_seats(&mut self, passengers: u32) -> Result<(), PoolError> {
        if passengers > self.occupied_seats() {
            return Err(PoolError::InvalidInput(format!(
                "car {} has {} occupied seats, cannot free {passengers}",
                self.id,
                self.occupied_seats()
            )));
        }
        self.available_seats += passengers;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_four_to_six_seats() {
        for seats in MIN_SEATS..=MAX_SEATS {
            let car = Car::new(CarId(1), seats).unwrap();
            assert_eq!(car.available_seats, seats);
            assert_eq!(car.occupied_seats(), 0);
        }
    }

    #[test]
    fn rejects_out_of_range_seats() {
        for seats in [0, 1, 3, 7, 100] {
            let err = Car::new(CarId(9), seats).unwrap_err();
            assert!(matches!(err, PoolError::InvalidInput(_)), "{seats}: {err}");
        }
    }

    #[test]
    fn take_and_free_seats() {
        let mut car = Car::new(CarId(1), 5).unwrap();
        car.take_seats(3).unwrap();
        assert_eq!(car.available_seats, 2);
        assert_eq!(car.occupied_seats(), 3);

        assert!(car.take_seats(3).is_err());
        assert_eq!(car.available_seats, 2, "failed take leaves seats alone");

        car.free_seats(3).unwrap();
        assert_eq!(car.available_seats, 5);
        assert!(car.free_seats(1).is_err(), "cannot free beyond capacity");
    }

    #[test]
    fn id_serializes_as_number() {
        assert_eq!(serde_json::to_string(&CarId(42)).unwrap(), "42");
        let id: CarId = serde_json::from_str("7").unwrap();
        assert_eq!(id, CarId(7));
    }
}
