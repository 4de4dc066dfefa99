//! Matching journeys to cars.
//!
//! New journeys go to the car with the tightest sufficient fit. When a car
//! frees seats, pending journeys are offered them in arrival order.

mod engine;
mod invariants;


pub use engine::{
    Assignment, Dropoff, NewCar, assign, dropoff, find_best_fit, locate, reassign, reset_fleet,
};
pub use invariants::check_invariants;
