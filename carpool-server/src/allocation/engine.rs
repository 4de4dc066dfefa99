//! Best-fit assignment, FIFO reassignment, dropoff, locate and fleet reset.
//!
//! Every function runs inside a caller-owned transaction and only touches
//! entities through the storage traits. None of them commit; on error the
//! caller rolls back.

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::domain::{Car, CarId, EntityKind, Journey, JourneyId, PoolError};
use crate::storage::{EntityStore, Transaction};

/// A car in a fleet reset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewCar {
    pub id: CarId,
    pub seats: u32,
}

impl NewCar {
    pub fn new(id: u32, seats: u32) -> Self {
        Self {
            id: CarId(id),
            seats,
        }
    }
}

/// Where a new journey ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assignment {
    /// Seated immediately; holds the car's state after seating.
    Assigned(Car),
    /// No car had room; appended to the pending queue.
    Pending,
}

/// Outcome of a dropoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dropoff {
    /// The journey as it was before removal.
    pub journey: Journey,
    /// The car whose seats were freed, or `None` if the journey was pending.
    pub freed_car: Option<Car>,
}

/// Pick the car with the fewest free seats that still fits `passengers`.
///
/// Ties go to the lowest car id, whatever order `cars` is in.
pub fn find_best_fit(cars: &[Car], passengers: u32) -> Option<&Car> {
    cars.iter()
        .filter(|car| car.fits(passengers))
        .min_by_key(|car| (car.available_seats, car.id))
}

/// Seat a new journey in the best-fitting car, or queue it.
pub fn assign<T: Transaction>(txn: &T, mut journey: Journey) -> Result<Assignment, PoolError> {
    if !journey.is_pending() {
        return Err(PoolError::InvalidInput(format!(
            "journey {} is already assigned",
            journey.id
        )));
    }
    match txn.journeys().find_by_id(journey.id) {
        Ok(_) => return Err(PoolError::conflict(EntityKind::Journey, journey.id)),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    let cars = txn.cars().list_all()?;
    let Some(best) = find_best_fit(&cars, journey.passengers) else {
        trace!(journey = %journey.id, passengers = journey.passengers, "no car fits, queueing");
        txn.journeys().insert(journey.clone())?;
        txn.pending().insert(journey)?;
        return Ok(Assignment::Pending);
    };

    let mut car = best.clone();
    car.take_seats(journey.passengers)?;
    txn.cars().update(car.id, car.clone())?;

    journey.assign_to(car.id);
    txn.journeys().insert(journey)?;

    Ok(Assignment::Assigned(car))
}

/// Offer a car's free seats to pending journeys, oldest first.
///
/// One pass over the queue in arrival order. Each journey that fits the
/// seats left at the moment it is visited gets the car; the rest stay
/// queued until the next reassignment. Returns the ids seated, in the order they were seated.
pub fn reassign<T: Transaction>(txn: &T, car_id: CarId) -> Result<Vec<JourneyId>, PoolError> {
    let mut car = txn.cars().find_by_id(car_id)?;
    let pending = txn.pending().list_all()?;
    debug!(car = %car_id, available = car.available_seats, pending = pending.len(), "reassigning");

    let mut seated = Vec::new();
    for mut journey in pending {
        if car.available_seats == 0 {
            break;
        }
        if !car.fits(journey.passengers) {
            continue;
        }

        car.take_seats(journey.passengers)?;
        journey.assign_to(car.id);
        txn.journeys().update(journey.id, journey.clone())?;
        txn.pending().delete_by_id(journey.id)?;
        seated.push(journey.id);
    }

    if !seated.is_empty() {
        txn.cars().update(car.id, car)?;
    }
    Ok(seated)
}

/// Remove a journey, freeing its seats if it had a car.
///
/// Reassigning the freed car is left to the caller, as a separate step
/// that must not fail the dropoff.
pub fn dropoff<T: Transaction>(txn: &T, journey_id: JourneyId) -> Result<Dropoff, PoolError> {
    let journey = txn.journeys().delete_by_id(journey_id)?;

    let freed_car = match journey.assigned_car {
        Some(car_id) => {
            let mut car = txn.cars().find_by_id(car_id)?;
            car.free_seats(journey.passengers)?;
            txn.cars().update(car_id, car.clone())?;
            Some(car)
        }
        None => {
            txn.pending().delete_by_id(journey_id)?;
            None
        }
    };

    Ok(Dropoff { journey, freed_car })
}

/// The car a journey rides in, or `None` while it waits.
pub fn locate<T: Transaction>(txn: &T, journey_id: JourneyId) -> Result<Option<Car>, PoolError> {
    let journey = txn.journeys().find_by_id(journey_id)?;
    journey
        .assigned_car
        .map(|car_id| txn.cars().find_by_id(car_id))
        .transpose()
}

/// Replace the whole fleet, discarding every journey.
///
/// The batch is validated before anything is cleared: seat counts must be
/// in range and ids unique. Returns the number of cars loaded.
pub fn reset_fleet<T: Transaction>(txn: &T, fleet: &[NewCar]) -> Result<usize, PoolError> {
    let mut seen = BTreeSet::new();
    let mut cars = Vec::with_capacity(fleet.len());
    for entry in fleet {
        let car = Car::new(entry.id, entry.seats)?;
        if !seen.insert(entry.id) {
            return Err(PoolError::conflict(EntityKind::Car, entry.id));
        }
        cars.push(car);
    }

    txn.pending().reset_all()?;
    txn.journeys().reset_all()?;
    txn.cars().reset_all()?;
    for car in cars {
        txn.cars().insert(car)?;
    }

    Ok(fleet.len())
}
