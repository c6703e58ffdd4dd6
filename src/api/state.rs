//! Application state for the API server

use crate::{Config, IconHunter};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned per request (cheap Arc clones). Handlers reach the job registry
/// through the engine handle; there is no global state.
#[derive(Clone)]
pub struct AppState {
    /// The engine instance
    pub hunter: Arc<IconHunter>,

    /// Configuration (read access for the API layer)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(hunter: Arc<IconHunter>, config: Arc<Config>) -> Self {
        Self { hunter, config }
    }
}
