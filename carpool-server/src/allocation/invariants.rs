//! Consistency checks across the three collections.

use std::collections::{BTreeMap, HashSet};

use crate::domain::{CarId, PoolError};
use crate::storage::{EntityStore, Transaction};

fn violation(message: String) -> PoolError {
    PoolError::StorageUnavailable(format!("invariant violated: {message}"))
}

/// Verify the store is consistent.
///
/// Checks that every car's free seats are within its capacity and that its
/// occupied seats equal the passengers assigned to it, that each journey is
/// either queued or assigned (never both, never neither), and that the
/// queue has no duplicates. Returns the first violation found.
pub fn check_invariants<T: Transaction>(txn: &T) -> Result<(), PoolError> {
    let cars = txn.cars().list_all()?;
    let journeys = txn.journeys().list_all()?;
    let pending = txn.pending().list_all()?;

    let mut queued = HashSet::new();
    for entry in &pending {
        if !queued.insert(entry.id) {
            return Err(violation(format!("journey {} queued twice", entry.id)));
        }
    }

    let mut occupied: BTreeMap<CarId, u32> = BTreeMap::new();
    for journey in &journeys {
        match journey.assigned_car {
            Some(car) => {
                if queued.contains(&journey.id) {
                    return Err(violation(format!(
                        "journey {} is assigned to car {car} and also queued",
                        journey.id
                    )));
                }
                *occupied.entry(car).or_default() += journey.passengers;
            }
            None => {
                if !queued.contains(&journey.id) {
                    return Err(violation(format!(
                        "journey {} is neither assigned nor queued",
                        journey.id
                    )));
                }
            }
        }
    }

    let known: HashSet<_> = journeys.iter().map(|j| j.id).collect();
    for entry in &pending {
        if !known.contains(&entry.id) || entry.assigned_car.is_some() {
            return Err(violation(format!(
                "queued journey {} has no matching pending journey",
                entry.id
            )));
        }
    }

    for car in &cars {
        if car.available_seats > car.total_seats {
            return Err(violation(format!(
                "car {} has {} free of {} seats",
                car.id, car.available_seats, car.total_seats
            )));
        }
        let assigned = occupied.remove(&car.id).unwrap_or(0);
        if car.occupied_seats() != assigned {
            return Err(violation(format!(
                "car {} has {} occupied seats but {assigned} assigned passengers",
                car.id,
                car.occupied_seats()
            )));
        }
    }

    if let Some((car, _)) = occupied.into_iter().next() {
        return Err(violation(format!("journeys assigned to unknown car {car}")));
    }

    Ok(())
}
