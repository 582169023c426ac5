//! Route request templates.
//!
//! A [`RouteConfig`] is built once from configuration and never mutated.
//! Relative dates and times (`today`, `tomorrow`, `now`) stay symbolic
//! until poll time so each tick queries against the current clock.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{Days, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::error::ValidationError;

/// Place type used when none is configured.
pub const DEFAULT_PLACE_TYPE: &str = "psma_addresses";

/// One end of a route: label, typed descriptor, coordinates and locality.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    /// Free-text label, e.g. "Perth Busport"
    pub location: String,
    /// Upstream place descriptor, e.g. "psma_addresses" or "stops"
    pub kind: String,
    /// "lat,lon" geocoordinate string
    pub position: String,
    /// Suburb or locality; may be blank
    pub locality: String,
}

impl Place {
    /// Create a place with the default type and no locality.
    pub fn new(location: impl Into<String>, position: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            kind: DEFAULT_PLACE_TYPE.to_string(),
            position: position.into(),
            locality: String::new(),
        }
    }

    /// Set the place type.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set the locality.
    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = locality.into();
        self
    }
}

/// How the requested time constrains the trip.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepartureOption {
    #[default]
    LeaveAfter,
    ArriveBy,
    EarliestTrip,
    LastTrip,
}

impl DepartureOption {
    /// Token used by the planner in both request surfaces and in planner URLs.
    pub fn upstream_token(self) -> &'static str {
        match self {
            DepartureOption::LeaveAfter => "LeaveAfter",
            DepartureOption::ArriveBy => "ArriveBy",
            DepartureOption::EarliestTrip => "EarliestTrip",
            DepartureOption::LastTrip => "LastTrip",
        }
    }

    /// Parse a planner token such as `ArriveBy`.
    pub fn from_upstream_token(token: &str) -> Option<Self> {
        match token {
            "LeaveAfter" => Some(DepartureOption::LeaveAfter),
            "ArriveBy" => Some(DepartureOption::ArriveBy),
            "EarliestTrip" => Some(DepartureOption::EarliestTrip),
            "LastTrip" => Some(DepartureOption::LastTrip),
            _ => None,
        }
    }
}

/// A transport mode the planner may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Bus,
    Train,
    Ferry,
    SchoolBus,
}

/// The set of enabled transport modes.
///
/// An empty set is allowed in configuration but never sent upstream:
/// see [`TransportModes::effective`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransportModes(BTreeSet<TransportMode>);

impl TransportModes {
    /// Build a set from any iterator of modes.
    pub fn new(modes: impl IntoIterator<Item = TransportMode>) -> Self {
        Self(modes.into_iter().collect())
    }

    /// The planner default: bus and train.
    pub fn bus_and_train() -> Self {
        Self::new([TransportMode::Bus, TransportMode::Train])
    }

    pub fn contains(&self, mode: TransportMode) -> bool {
        self.0.contains(&mode)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = TransportMode> + '_ {
        self.0.iter().copied()
    }

    /// The modes actually requested: bus and train when nothing is enabled.
    pub fn effective(&self) -> Self {
        if self.is_empty() {
            Self::bus_and_train()
        } else {
            self.clone()
        }
    }
}

impl FromIterator<TransportMode> for TransportModes {
    fn from_iter<I: IntoIterator<Item = TransportMode>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Walking pace assumed by the planner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalkSpeed {
    Slow,
    #[default]
    Normal,
    Fast,
}

impl WalkSpeed {
    /// Token for the JSON API (`SLOW`, `NORMAL`, `FAST`).
    pub fn api_token(self) -> &'static str {
        match self {
            WalkSpeed::Slow => "SLOW",
            WalkSpeed::Normal => "NORMAL",
            WalkSpeed::Fast => "FAST",
        }
    }

    /// Token for the results page query string (`Slow`, `Normal`, `Fast`).
    pub fn legacy_token(self) -> &'static str {
        match self {
            WalkSpeed::Slow => "Slow",
            WalkSpeed::Normal => "Normal",
            WalkSpeed::Fast => "Fast",
        }
    }

    /// Case-insensitive parse of `slow`, `normal` or `fast`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Some(WalkSpeed::Slow),
            "normal" => Some(WalkSpeed::Normal),
            "fast" => Some(WalkSpeed::Fast),
            _ => None,
        }
    }
}

/// Requested travel date.
///
/// Blank and `today` both mean the poll-time date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DateSpec {
    #[default]
    Today,
    Tomorrow,
    /// A literal `YYYY-MM-DD` date, passed through unchanged.
    Fixed(String),
}

impl DateSpec {
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("today") {
            DateSpec::Today
        } else if trimmed.eq_ignore_ascii_case("tomorrow") {
            DateSpec::Tomorrow
        } else {
            DateSpec::Fixed(trimmed.to_string())
        }
    }

    /// Resolve to a literal `YYYY-MM-DD` date against `now`.
    pub fn resolve(&self, now: NaiveDateTime) -> String {
        match self {
            DateSpec::Today => now.format("%Y-%m-%d").to_string(),
            DateSpec::Tomorrow => now
                .checked_add_days(Days::new(1))
                .unwrap_or(now)
                .format("%Y-%m-%d")
                .to_string(),
            DateSpec::Fixed(date) => date.clone(),
        }
    }
}

impl From<String> for DateSpec {
    fn from(s: String) -> Self {
        DateSpec::parse(&s)
    }
}

impl From<DateSpec> for String {
    fn from(spec: DateSpec) -> Self {
        spec.to_string()
    }
}

impl fmt::Display for DateSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateSpec::Today => f.write_str("today"),
            DateSpec::Tomorrow => f.write_str("tomorrow"),
            DateSpec::Fixed(date) => f.write_str(date),
        }
    }
}

/// Requested travel time. Blank and `now` both mean the poll-time clock.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TimeSpec {
    #[default]
    Now,
    /// A literal `HH:MM` time, passed through unchanged.
    Fixed(String),
}

impl TimeSpec {
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("now") {
            TimeSpec::Now
        } else {
            TimeSpec::Fixed(trimmed.to_string())
        }
    }

    /// Resolve to a literal `HH:MM` time against `now`.
    pub fn resolve(&self, now: NaiveDateTime) -> String {
        match self {
            TimeSpec::Now => now.format("%H:%M").to_string(),
            TimeSpec::Fixed(time) => time.clone(),
        }
    }
}

impl From<String> for TimeSpec {
    fn from(s: String) -> Self {
        TimeSpec::parse(&s)
    }
}

impl From<TimeSpec> for String {
    fn from(spec: TimeSpec) -> Self {
        match spec {
            TimeSpec::Now => "now".to_string(),
            TimeSpec::Fixed(time) => time,
        }
    }
}

/// Immutable request template for one named route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    pub name: String,
    pub from: Place,
    pub to: Place,
    pub date: DateSpec,
    pub time: TimeSpec,
    pub departure_option: DepartureOption,
    pub transport_options: TransportModes,
    pub walk_speed: WalkSpeed,
    /// `None` means unlimited.
    pub max_connections: Option<u32>,
    /// Metres, optionally with a unit suffix ("2000m"). `None` means the planner default.
    pub max_walking_distance: Option<String>,
}

impl RouteConfig {
    /// Create a route leaving now, by bus or train, at normal walking pace.
    pub fn new(name: impl Into<String>, from: Place, to: Place) -> Self {
        Self {
            name: name.into(),
            from,
            to,
            date: DateSpec::Today,
            time: TimeSpec::Now,
            departure_option: DepartureOption::LeaveAfter,
            transport_options: TransportModes::bus_and_train(),
            walk_speed: WalkSpeed::Normal,
            max_connections: None,
            max_walking_distance: None,
        }
    }

    /// Check the fields the planner cannot do without.
    ///
    /// Must pass before any request is built or sent.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("from_location", &self.from.location),
            ("to_location", &self.to.location),
            ("from_position", &self.from.position),
            ("to_position", &self.to.position),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(field));
            }
        }
        Ok(())
    }
}
