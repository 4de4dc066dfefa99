//! The car pool service.
//!
//! Wraps every operation in its own transaction: begin, run the allocation
//! step, commit, or roll back on any error. This is the layer callers (the
//! web handlers, tests) talk to.

use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::allocation::{self, Assignment, NewCar};
use crate::domain::{Car, CarId, Journey, JourneyId, PoolError};
use crate::storage::{EntityStore, Transaction, TransactionFactory};

/// Summary of the fleet, for the status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetStatus {
    pub cars: usize,
    pub total_seats: u32,
    pub available_seats: u32,
    pub assigned_journeys: usize,
    pub pending_journeys: usize,
}

/// Car pool operations over a storage backend.
pub struct CarPool<F> {
    storage: F,
}

/// Surface backend failures as `StorageUnavailable`, keeping the message.
fn unavailable(err: PoolError) -> PoolError {
    match err {
        PoolError::StorageUnavailable(_) => err,
        other => PoolError::StorageUnavailable(other.to_string()),
    }
}

impl<F: TransactionFactory> CarPool<F> {
    pub fn new(storage: F) -> Self {
        Self { storage }
    }

    /// The underlying backend.
    pub fn storage(&self) -> &F {
        &self.storage
    }

    /// Run `op` in a fresh transaction.
    ///
    /// Commits if `op` succeeds, otherwise rolls back and returns its
    /// error. Debug builds also check store consistency before committing.
    fn in_transaction<'s, R>(
        &'s self,
        operation: &'static str,
        op: impl FnOnce(&F::Transaction<'s>) -> Result<R, PoolError>,
    ) -> Result<R, PoolError> {
        let mut txn = self.storage.begin().map_err(|e| {
            error!(operation, error = %e, "failed to begin transaction");
            unavailable(e)
        })?;

        let result = op(&txn).and_then(|value| {
            if cfg!(debug_assertions) {
                allocation::check_invariants(&txn)?;
            }
            Ok(value)
        });

        match result {
            Ok(value) => {
                txn.commit().map_err(|e| {
                    error!(operation, error = %e, "failed to commit transaction");
                    unavailable(e)
                })?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = txn.rollback() {
                    error!(operation, error = %rollback_err, "rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Replace the fleet, discarding all journeys.
    pub fn reset_cars(&self, fleet: &[NewCar]) -> Result<usize, PoolError> {
        let start = Instant::now();
        info!(cars = fleet.len(), "resetting fleet");

        let loaded = self
            .in_transaction("reset_cars", |txn| allocation::reset_fleet(txn, fleet))
            .inspect_err(|e| error!(error = %e, "fleet reset failed"))?;

        info!(
            cars = loaded,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "fleet reset complete"
        );
        Ok(loaded)
    }

    /// Register a journey, seating it now if any car has room.
    pub fn new_journey(&self, id: JourneyId, passengers: u32) -> Result<Assignment, PoolError> {
        let start = Instant::now();
        info!(journey = %id, passengers, "new journey");

        let journey = Journey::new(id, passengers)?;
        let assignment = self
            .in_transaction("new_journey", |txn| allocation::assign(txn, journey))
            .inspect_err(|e| error!(journey = %id, error = %e, "journey request failed"))?;

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &assignment {
            Assignment::Assigned(car) => info!(
                journey = %id,
                car = %car.id,
                passengers,
                available_seats = car.available_seats,
                elapsed_ms,
                "journey assigned to car"
            ),
            Assignment::Pending => {
                info!(journey = %id, passengers, elapsed_ms, "journey queued")
            }
        }
        Ok(assignment)
    }

    /// Finish a journey.
    ///
    /// Returns the car that freed seats, or `None` if the journey was still
    /// waiting. The freed car is then offered to pending journeys; if that
    /// follow-up fails it is logged and the dropoff still succeeds.
    pub fn dropoff(&self, id: JourneyId) -> Result<Option<Car>, PoolError> {
        let start = Instant::now();
        info!(journey = %id, "dropoff");

        let outcome = self
            .in_transaction("dropoff", |txn| allocation::dropoff(txn, id))
            .inspect_err(|e| warn!(journey = %id, error = %e, "dropoff failed"))?;

        let Some(car) = outcome.freed_car else {
            info!(
                journey = %id,
                passengers = outcome.journey.passengers,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "pending journey dropped"
            );
            return Ok(None);
        };

        info!(
            journey = %id,
            car = %car.id,
            passengers = outcome.journey.passengers,
            available_seats = car.available_seats,
            "journey dropped off"
        );
        if let Err(e) = self.reassign(car.id) {
            warn!(car = %car.id, journey = %id, error = %e, "reassignment after dropoff failed");
        }
        info!(
            journey = %id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "dropoff complete"
        );
        Ok(Some(car))
    }

    /// Offer a car's free seats to pending journeys in arrival order.
    pub fn reassign(&self, car_id: CarId) -> Result<Vec<JourneyId>, PoolError> {
        let start = Instant::now();
        let seated =
            self.in_transaction("reassign", |txn| allocation::reassign(txn, car_id))?;

        for journey in &seated {
            info!(car = %car_id, journey = %journey, "pending journey assigned to car");
        }
        debug!(
            car = %car_id,
            seated = seated.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "reassignment complete"
        );
        Ok(seated)
    }

    /// The car a journey rides in, or `None` while it waits.
    pub fn locate(&self, id: JourneyId) -> Result<Option<Car>, PoolError> {
        let car = self
            .in_transaction("locate", |txn| allocation::locate(txn, id))
            .inspect_err(|e| warn!(journey = %id, error = %e, "locate failed"))?;

        match &car {
            Some(car) => debug!(journey = %id, car = %car.id, "journey located"),
            None => debug!(journey = %id, "journey not yet assigned"),
        }
        Ok(car)
    }

    /// Count cars, seats and journeys.
    pub fn status(&self) -> Result<FleetStatus, PoolError> {
        self.in_transaction("status", |txn| {
            let cars = txn.cars().list_all()?;
            let journeys = txn.journeys().list_all()?;
            let pending = txn.pending().list_all()?;
            Ok(FleetStatus {
                cars: cars.len(),
                total_seats: cars.iter().map(|c| c.total_seats).sum(),
                available_seats: cars.iter().map(|c| c.available_seats).sum(),
                assigned_journeys: journeys.len() - pending.len(),
                pending_journeys: pending.len(),
            })
        })
    }
}
