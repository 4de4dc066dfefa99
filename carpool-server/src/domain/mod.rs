//! Domain types for the car pool.
//!
//! Constructors validate seat counts and passenger counts, so anything
//! holding a `Car` or `Journey` can rely on those bounds.

mod car;
mod error;
mod journey;

pub use car::{Car, CarId, MAX_SEATS, MIN_SEATS};
pub use error::{EntityKind, PoolError};
pub use journey::{Journey, JourneyId};
