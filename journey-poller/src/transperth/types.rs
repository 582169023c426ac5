//! Planner API response DTOs.
//!
//! These map directly to the `PlanJourney` JSON response. Journey and trip
//! entries are kept as raw [`serde_json::Value`] at the envelope level so
//! one malformed entry can be skipped without failing the whole response.

use serde::{Deserialize, Deserializer};

/// Envelope returned by `PlanJourney`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanJourneyResponse {
    /// `"success"` on success; anything else is a rejection.
    pub result: Option<String>,

    /// Journey list. Absent or null when there are no journeys.
    #[serde(default)]
    pub data: serde_json::Value,
}

/// One journey entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct JourneyDto {
    /// Display departure time, e.g. "7:42am"
    #[serde(default, deserialize_with = "lenient_string")]
    pub jny_display_depart_time: Option<String>,

    /// Display arrival time
    #[serde(default, deserialize_with = "lenient_string")]
    pub jny_display_arrive_time: Option<String>,

    /// Total duration, e.g. "69 mins"
    #[serde(default, deserialize_with = "lenient_string")]
    pub jny_duration: Option<String>,

    /// Planner ranking, 1-based. Sometimes sent as a string.
    #[serde(default, deserialize_with = "lenient_string")]
    pub jny_number: Option<String>,

    /// Legs, kept raw so each can fail independently.
    #[serde(default)]
    pub jny_trip_details: Option<serde_json::Value>,
}

/// One leg within a journey entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TripDetailDto {
    /// "Walk", "Bus", "Train", "Ferry"; may be absent
    #[serde(default, deserialize_with = "lenient_string")]
    pub trip_vehicle: Option<String>,

    /// Line number or name
    #[serde(default, deserialize_with = "lenient_string")]
    pub route_code: Option<String>,

    /// e.g. "Catch Bus 276", "Walk to Stop 10361"
    #[serde(default, deserialize_with = "lenient_string")]
    pub display_trip_title: Option<String>,

    /// e.g. "12 mins"
    #[serde(default, deserialize_with = "lenient_string")]
    pub display_trip_duration: Option<String>,
}

/// Accept a string, a number or null.
///
/// The planner is inconsistent about quoting numeric fields such as
/// route codes and journey numbers.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Lenient {
        Str(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    Ok(
        Option::<Lenient>::deserialize(deserializer)?.map(|v| match v {
            Lenient::Str(s) => s,
            Lenient::Int(n) => n.to_string(),
            Lenient::Float(n) => n.to_string(),
            Lenient::Bool(b) => b.to_string(),
        }),
    )
}
