//! HTTP adapter for the car pool.
//!
//! Decodes requests, calls the service, and maps results and errors to
//! status codes. No allocation logic lives here.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::create_router;
pub use state::AppState;
