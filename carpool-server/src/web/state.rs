//! Application state for the web layer.

use std::sync::Arc;

use crate::service::CarPool;
use crate::storage::MemoryStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// The car pool, shared by every request
    pub pool: Arc<CarPool<MemoryStore>>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(pool: CarPool<MemoryStore>) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}
