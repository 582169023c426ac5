//! Request construction for both planner surfaces.
//!
//! The JSON API and the legacy results page accept the same information
//! under different names and casing. Both builders apply the same defaults:
//! bus and train when no mode is enabled, unlimited connections as `-1`,
//! and a 2000 m walking limit.

use serde::Serialize;

use crate::domain::{DEFAULT_PLACE_TYPE, RouteConfig, TransportMode};

/// Walking distance sent when the route does not set one.
pub const DEFAULT_MAX_WALKING_DISTANCE: &str = "2000";

/// Note codes requested alongside every journey.
pub const RETURN_NOTE_CODES: &str = "DV,LM,CM,JC,TC,BG,FG,LK";

/// Maximum number of journeys requested.
pub const MAX_JOURNEYS: &str = "5";

/// JSON body for `PlanJourney`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlanJourneyRequest {
    pub from_location_name: String,
    pub from_location_type: String,
    pub from_location_position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_location_locality: Option<String>,
    pub to_location_name: String,
    pub to_location_type: String,
    pub to_location_position: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_location_locality: Option<String>,
    pub journey_date: String,
    pub journey_time: String,
    pub departure_option: &'static str,
    pub transport_bus: bool,
    pub transport_train: bool,
    pub transport_ferry: bool,
    pub transport_school_bus: bool,
    pub walk_speed: &'static str,
    pub max_connections: String,
    pub max_walking_distance: String,
    pub return_notes: bool,
    pub return_note_codes: &'static str,
    pub max_journeys: &'static str,
}

impl PlanJourneyRequest {
    /// Build the body for `route` at an already-resolved date and time.
    pub fn from_route(route: &RouteConfig, date: &str, time: &str) -> Self {
        let modes = route.transport_options.effective();

        Self {
            from_location_name: route.from.location.trim().to_string(),
            from_location_type: place_type(&route.from.kind),
            from_location_position: route.from.position.trim().to_string(),
            from_location_locality: non_blank(&route.from.locality),
            to_location_name: route.to.location.trim().to_string(),
            to_location_type: place_type(&route.to.kind),
            to_location_position: route.to.position.trim().to_string(),
            to_location_locality: non_blank(&route.to.locality),
            journey_date: date.trim().to_string(),
            journey_time: time.trim().to_string(),
            departure_option: route.departure_option.upstream_token(),
            transport_bus: modes.contains(TransportMode::Bus),
            transport_train: modes.contains(TransportMode::Train),
            transport_ferry: modes.contains(TransportMode::Ferry),
            transport_school_bus: modes.contains(TransportMode::SchoolBus),
            walk_speed: route.walk_speed.api_token(),
            max_connections: encode_max_connections(route.max_connections),
            max_walking_distance: encode_walking_distance(route.max_walking_distance.as_deref()),
            return_notes: true,
            return_note_codes: RETURN_NOTE_CODES,
            max_journeys: MAX_JOURNEYS,
        }
    }
}

/// Query parameters for the legacy results page.
///
/// Uses the same names the planner puts in its own shareable URLs.
pub fn legacy_query(route: &RouteConfig, date: &str, time: &str) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("from", route.from.location.trim().to_string()),
        ("fromtype", place_type(&route.from.kind)),
        ("fromposition", route.from.position.trim().to_string()),
    ];
    if let Some(locality) = non_blank(&route.from.locality) {
        query.push(("fromlocality", locality));
    }

    query.extend([
        ("to", route.to.location.trim().to_string()),
        ("totype", place_type(&route.to.kind)),
        ("toposition", route.to.position.trim().to_string()),
    ]);
    if let Some(locality) = non_blank(&route.to.locality) {
        query.push(("tolocality", locality));
    }

    query.extend([
        ("date", date.trim().to_string()),
        ("time", time.trim().to_string()),
        (
            "departureOption",
            route.departure_option.upstream_token().to_string(),
        ),
    ]);

    for mode in route.transport_options.effective().iter() {
        query.push((legacy_mode_flag(mode), "on".to_string()));
    }

    query.extend([
        ("walkSpeed", route.walk_speed.legacy_token().to_string()),
        ("maxConnections", encode_max_connections(route.max_connections)),
        (
            "maxWalkingDistance",
            encode_walking_distance(route.max_walking_distance.as_deref()),
        ),
    ]);

    query
}

/// Query flag name for a transport mode in planner URLs.
pub fn legacy_mode_flag(mode: TransportMode) -> &'static str {
    match mode {
        TransportMode::Bus => "bus",
        TransportMode::Train => "train",
        TransportMode::Ferry => "ferry",
        TransportMode::SchoolBus => "schoolbus",
    }
}

/// Parse a planner URL mode flag.
pub fn mode_from_legacy_flag(flag: &str) -> Option<TransportMode> {
    match flag {
        "bus" => Some(TransportMode::Bus),
        "train" => Some(TransportMode::Train),
        "ferry" => Some(TransportMode::Ferry),
        "schoolbus" => Some(TransportMode::SchoolBus),
        _ => None,
    }
}

/// `-1` for unlimited, otherwise the literal count.
pub fn encode_max_connections(max: Option<u32>) -> String {
    match max {
        Some(n) => n.to_string(),
        None => "-1".to_string(),
    }
}

/// Strip any `m`/`M` unit suffix; blank or absent means the default.
pub fn encode_walking_distance(distance: Option<&str>) -> String {
    let stripped = distance
        .map(|d| d.replace(['m', 'M'], ""))
        .map(|d| d.trim().to_string())
        .unwrap_or_default();

    if stripped.is_empty() {
        DEFAULT_MAX_WALKING_DISTANCE.to_string()
    } else {
        stripped
    }
}

fn place_type(kind: &str) -> String {
    let kind = kind.trim();
    if kind.is_empty() {
        DEFAULT_PLACE_TYPE.to_string()
    } else {
        kind.to_string()
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
