//! Domain types for the journey poller.
//!
//! Route request templates on one side, normalized planner results on the
//! other. Nothing in here performs I/O.

mod error;
mod journey;
mod route;

pub use error::ValidationError;
pub use journey::{JourneyData, JourneyLeg, JourneyOption, LegType};
pub use route::{
    DEFAULT_PLACE_TYPE, DateSpec, DepartureOption, Place, RouteConfig, TimeSpec, TransportMode,
    TransportModes, WalkSpeed,
};
