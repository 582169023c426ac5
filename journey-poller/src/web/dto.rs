//! Data transfer objects for web requests and responses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::JourneyData;
use crate::poller::{OptionView, RouteStatus, Snapshot};

/// Registered instances.
#[derive(Debug, Serialize)]
pub struct InstancesResponse {
    pub instances: Vec<InstanceSummary>,
}

#[derive(Debug, Serialize)]
pub struct InstanceSummary {
    pub id: String,

    /// Route names in configuration order
    pub routes: Vec<String>,

    /// Time of the last published snapshot, if any
    pub updated_at: Option<String>,
}

/// Routes of one instance.
#[derive(Debug, Serialize)]
pub struct RoutesResponse {
    pub instance: String,
    pub routes: Vec<RouteSummary>,
}

#[derive(Debug, Serialize)]
pub struct RouteSummary {
    pub name: String,

    /// Whether the latest snapshot holds data for this route
    pub available: bool,

    pub option_count: usize,

    /// Outcome of the last attempt; absent before the first poll
    pub status: Option<StatusResult>,
}

/// Full result for one route.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub name: String,
    pub status: Option<StatusResult>,

    /// Absent when the last fetch failed or no poll has run yet
    pub journey: Option<JourneyResult>,
}

#[derive(Debug, Serialize)]
pub struct JourneyResult {
    pub from: String,
    pub to: String,
    pub date: String,
    pub time: String,
    pub options: Vec<OptionView>,
}

/// Last-attempt status of a route.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    pub ok: bool,
    pub attempted_at: String,

    /// Number of options found, on success
    pub options: Option<usize>,

    /// "transport", "upstream_rejected", ... on failure
    pub error_kind: Option<&'static str>,

    pub message: Option<String>,
}

/// Manual refresh request. Both filters are optional.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    pub entry_id: Option<String>,
    pub route: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Number of instances refreshed
    pub refreshed: usize,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

// Conversion implementations

impl StatusResult {
    pub fn from_status(status: &RouteStatus) -> Self {
        match status {
            RouteStatus::Ok { at, options } => Self {
                ok: true,
                attempted_at: format_timestamp(*at),
                options: Some(*options),
                error_kind: None,
                message: None,
            },
            RouteStatus::Failed { at, kind, message } => Self {
                ok: false,
                attempted_at: format_timestamp(*at),
                options: None,
                error_kind: Some(kind.as_str()),
                message: Some(message.clone()),
            },
        }
    }
}

impl RouteSummary {
    pub fn from_snapshot(name: &str, snapshot: &Snapshot) -> Self {
        let data = snapshot.get(name);
        Self {
            name: name.to_string(),
            available: data.is_some(),
            option_count: data.map_or(0, |d| d.options.len()),
            status: snapshot.status(name).map(StatusResult::from_status),
        }
    }
}

impl RouteResponse {
    pub fn from_snapshot(name: &str, snapshot: &Snapshot) -> Self {
        Self {
            name: name.to_string(),
            status: snapshot.status(name).map(StatusResult::from_status),
            journey: snapshot
                .get(name)
                .map(|data| JourneyResult::from_data(name, data, snapshot)),
        }
    }
}

impl JourneyResult {
    fn from_data(name: &str, data: &JourneyData, snapshot: &Snapshot) -> Self {
        Self {
            from: data.from_location.clone(),
            to: data.to_location.clone(),
            date: data.date.clone(),
            time: data.time.clone(),
            options: (1..=data.options.len())
                .map(|slot| snapshot.option_view(name, slot))
                .collect(),
        }
    }
}

/// Format a snapshot time as "YYYY-MM-DDTHH:MM:SS" (local time).
pub fn format_timestamp(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}
