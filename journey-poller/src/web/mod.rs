//! Web layer for the journey poller.
//!
//! Read-only JSON views of the latest snapshots, plus a manual refresh
//! trigger.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
