//! Transperth Journey Planner client.
//!
//! This module talks to the public Transperth website, which offers two
//! ways of planning a journey:
//! - a JSON `PlanJourney` API that needs session headers scraped from the
//!   landing page
//! - a legacy HTML results page addressed by query string
//!
//! Both are normalized into [`JourneyData`](crate::domain::JourneyData).
//! Times are display strings such as "7:42am" and are never parsed.

mod client;
pub mod convert;
mod error;
pub mod html;
mod request;
mod session;
mod types;

pub use client::{Surface, TransperthClient, TransperthConfig};
pub use error::{ErrorKind, NormalizeError, TransperthError};
pub use request::{
    PlanJourneyRequest, encode_max_connections, encode_walking_distance, legacy_mode_flag,
    legacy_query, mode_from_legacy_flag,
};
pub use session::{
    DEFAULT_MODULE_ID, DEFAULT_TAB_ID, DefaultTokens, LandingPageTokens, SessionTokens,
    TokenSource,
};
pub use types::{JourneyDto, PlanJourneyResponse, TripDetailDto};
