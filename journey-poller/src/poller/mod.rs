//! Scheduled polling of configured routes.
//!
//! A [`Poller`] owns one [`RouteRegistry`](crate::registry::RouteRegistry)
//! and publishes a [`Snapshot`] per cycle. Routes are fetched concurrently;
//! a failing route is logged and left out without affecting the others.

mod clock;
mod orchestrator;
mod snapshot;
mod source;

pub use clock::{Clock, SystemClock};
pub use orchestrator::Poller;
pub use snapshot::{
    JourneyAttributes, LegView, OPTION_SLOTS, OptionAttributes, OptionView, RouteStatus, Snapshot,
};
pub use source::JourneySource;

#[cfg(test)]
mod poller_tests;
