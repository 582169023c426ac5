//! Conversion from planner JSON to domain types.
//!
//! Each journey and each leg is converted independently. A malformed entry
//! is logged and skipped; only a payload that is not a list at all is an
//! error.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::domain::{JourneyLeg, JourneyOption, LegType};

use super::error::NormalizeError;
use super::types::{JourneyDto, TripDetailDto};

/// Title prefixes removed when building a leg description, checked in order.
const TITLE_PREFIXES: [&str; 3] = ["Catch ", "Walk to ", "Walk "];

/// Convert the `data` member of a `PlanJourney` response.
///
/// Null means no journeys. Options keep the planner's order and are
/// numbered 1.. among the entries that converted, so `index` always matches
/// the option's slot.
pub fn normalize(data: &Value) -> Result<Vec<JourneyOption>, NormalizeError> {
    let entries = match data {
        Value::Null => return Ok(Vec::new()),
        Value::Array(entries) => entries,
        other => return Err(NormalizeError::NotAList(json_type(other))),
    };

    let mut options = Vec::with_capacity(entries.len());

    for (position, entry) in entries.iter().enumerate() {
        let index = options.len() as u32 + 1;
        match convert_journey(entry, position + 1, index) {
            Ok(option) => options.push(option),
            Err(e) => {
                // Skip this journey rather than failing the whole response
                warn!(position = position + 1, error = %e, "Skipping malformed journey entry");
            }
        }
    }

    Ok(options)
}

/// Convert a single journey entry. `position` is its 1-based array position,
/// used for logging.
fn convert_journey(
    entry: &Value,
    position: usize,
    index: u32,
) -> Result<JourneyOption, serde_json::Error> {
    let dto = JourneyDto::deserialize(entry)?;

    let legs = match &dto.jny_trip_details {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(trips)) => trips
            .iter()
            .enumerate()
            .filter_map(|(i, trip)| match TripDetailDto::deserialize(trip) {
                Ok(trip) => Some(convert_trip(&trip)),
                Err(e) => {
                    warn!(journey = position, leg = i + 1, error = %e, "Skipping malformed leg");
                    None
                }
            })
            .collect(),
        Some(other) => {
            warn!(
                journey = position,
                found = json_type(other),
                "Trip details are not a list, keeping journey without legs"
            );
            Vec::new()
        }
    };

    Ok(JourneyOption {
        leave_time: dto.jny_display_depart_time.unwrap_or_default(),
        arrive_time: dto.jny_display_arrive_time.unwrap_or_default(),
        travel_time: dto.jny_duration.unwrap_or_default(),
        legs,
        index,
    })
}

/// Convert one leg.
pub fn convert_trip(trip: &TripDetailDto) -> JourneyLeg {
    let vehicle = trip.trip_vehicle.as_deref().unwrap_or("");
    let title = trip.display_trip_title.as_deref().unwrap_or("");
    let duration = trip.display_trip_duration.as_deref().unwrap_or("");
    let service_code = trip
        .route_code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    JourneyLeg {
        leg_type: classify_trip(Some(vehicle), title),
        description: describe_trip(service_code.as_deref(), title, duration, vehicle),
        service_code,
    }
}

/// Classify a leg from its vehicle kind, falling back to its title.
///
/// Title keywords are matched case-insensitively in the order
/// walk, bus, train, ferry, cat. Anything unrecognised is a walk.
pub fn classify_trip(vehicle: Option<&str>, title: &str) -> LegType {
    if let Some(leg_type) = vehicle.and_then(leg_type_for_vehicle) {
        return leg_type;
    }

    let title = title.to_lowercase();
    [
        ("walk", LegType::Walk),
        ("bus", LegType::Bus),
        ("train", LegType::Train),
        ("ferry", LegType::Ferry),
        ("cat", LegType::Cat),
    ]
    .into_iter()
    .find(|(keyword, _)| title.contains(keyword))
    .map(|(_, leg_type)| leg_type)
    .unwrap_or(LegType::Walk)
}

fn leg_type_for_vehicle(vehicle: &str) -> Option<LegType> {
    match vehicle.trim().to_lowercase().as_str() {
        "walk" => Some(LegType::Walk),
        "bus" => Some(LegType::Bus),
        "train" => Some(LegType::Train),
        "ferry" => Some(LegType::Ferry),
        "cat" => Some(LegType::Cat),
        _ => None,
    }
}

/// Build a leg description: route code, de-prefixed title, then
/// parenthesized duration, joined by single spaces.
///
/// Falls back to the raw title, then the vehicle kind, when none of the
/// parts are present.
pub fn describe_trip(
    route_code: Option<&str>,
    title: &str,
    duration: &str,
    vehicle: &str,
) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(3);

    if let Some(code) = route_code.filter(|c| !c.is_empty()) {
        parts.push(code.to_string());
    }

    let cleaned = strip_title_prefix(title.trim());
    if !cleaned.is_empty() {
        parts.push(cleaned.to_string());
    }

    if !duration.trim().is_empty() {
        parts.push(format!("({})", duration.trim()));
    }

    if !parts.is_empty() {
        parts.join(" ")
    } else if !title.trim().is_empty() {
        title.trim().to_string()
    } else {
        vehicle.trim().to_string()
    }
}

fn strip_title_prefix(title: &str) -> &str {
    TITLE_PREFIXES
        .iter()
        .find_map(|prefix| title.strip_prefix(prefix))
        .unwrap_or(title)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
