//! Application state for the web layer.

use crate::hub::PollerHub;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Every polled instance, by id
    pub hub: PollerHub,
}

impl AppState {
    pub fn new(hub: PollerHub) -> Self {
        Self { hub }
    }
}
