pub mod attendance;
pub mod scan;
pub mod subject;

use crate::clock::Clock;
use crate::engine::SessionEngine;
use std::sync::Arc;

/// Shared application state. Generic over the store so the HTTP layer runs
/// against MySQL in production and the in-memory store in tests.
pub struct AppState<S> {
    pub store: S,
    pub engine: SessionEngine,
    pub clock: Arc<dyn Clock>,
}
