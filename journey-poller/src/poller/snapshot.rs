//! Published poll results.

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::{JourneyData, JourneyLeg, JourneyOption};
use crate::transperth::ErrorKind;

/// Number of option slots exposed per route.
pub const OPTION_SLOTS: usize = 5;

/// Outcome of the most recent attempt to fetch one route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteStatus {
    Ok {
        at: NaiveDateTime,
        options: usize,
    },
    Failed {
        at: NaiveDateTime,
        kind: ErrorKind,
        message: String,
    },
}

impl RouteStatus {
    pub fn attempted_at(&self) -> NaiveDateTime {
        match self {
            RouteStatus::Ok { at, .. } | RouteStatus::Failed { at, .. } => *at,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, RouteStatus::Ok { .. })
    }
}

/// Results of the latest poll, keyed by route name.
///
/// A route whose last fetch failed has a status but no data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    routes: HashMap<String, JourneyData>,
    statuses: HashMap<String, RouteStatus>,
    updated_at: Option<NaiveDateTime>,
}

impl Snapshot {
    pub(crate) fn new(updated_at: NaiveDateTime) -> Self {
        Self {
            routes: HashMap::new(),
            statuses: HashMap::new(),
            updated_at: Some(updated_at),
        }
    }

    /// Record a successful fetch.
    pub(crate) fn insert(&mut self, route: &str, data: JourneyData, at: NaiveDateTime) {
        self.statuses.insert(
            route.to_string(),
            RouteStatus::Ok {
                at,
                options: data.options.len(),
            },
        );
        self.routes.insert(route.to_string(), data);
        self.updated_at = Some(at);
    }

    /// Record a failed fetch. Any data for the route is dropped.
    pub(crate) fn fail(&mut self, route: &str, kind: ErrorKind, message: String, at: NaiveDateTime) {
        self.routes.remove(route);
        self.statuses
            .insert(route.to_string(), RouteStatus::Failed { at, kind, message });
        self.updated_at = Some(at);
    }

    pub fn get(&self, route: &str) -> Option<&JourneyData> {
        self.routes.get(route)
    }

    pub fn status(&self, route: &str) -> Option<&RouteStatus> {
        self.statuses.get(route)
    }

    /// Routes that currently have data.
    pub fn routes(&self) -> impl Iterator<Item = (&str, &JourneyData)> {
        self.routes.iter().map(|(name, data)| (name.as_str(), data))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// When this snapshot was last written; `None` before the first poll.
    pub fn updated_at(&self) -> Option<NaiveDateTime> {
        self.updated_at
    }

    /// Presentation view of option `slot` (1-based) of `route`.
    pub fn option_view(&self, route: &str, slot: usize) -> OptionView {
        let found = self
            .get(route)
            .and_then(|data| data.option(slot).map(|option| (data, option)));

        match found {
            Some((data, option)) => OptionView::populated(route, slot, data, option),
            None => OptionView::unavailable(route, slot),
        }
    }
}

/// One option slot as seen by a display layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    /// `"{leave} → {arrive}"`, absent when there is no such option
    pub state: Option<String>,
    pub attributes: OptionAttributes,
}

/// Attribute bundle for an option slot.
///
/// Only `route_name` and `option_index` are set when the slot is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionAttributes {
    pub route_name: String,
    pub option_index: usize,
    #[serde(flatten)]
    pub journey: Option<JourneyAttributes>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JourneyAttributes {
    pub leave_time: String,
    pub arrive_time: String,
    pub travel_time: String,
    pub from: String,
    pub to: String,
    pub date: String,
    pub time: String,
    pub legs: Vec<LegView>,
    pub leg_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegView {
    #[serde(rename = "type")]
    pub leg_type: &'static str,
    pub description: String,
    pub service_code: Option<String>,
}

impl From<&JourneyLeg> for LegView {
    fn from(leg: &JourneyLeg) -> Self {
        Self {
            leg_type: leg.leg_type.as_str(),
            description: leg.description.clone(),
            service_code: leg.service_code.clone(),
        }
    }
}

impl OptionView {
    fn unavailable(route: &str, slot: usize) -> Self {
        Self {
            state: None,
            attributes: OptionAttributes {
                route_name: route.to_string(),
                option_index: slot,
                journey: None,
            },
        }
    }

    fn populated(route: &str, slot: usize, data: &JourneyData, option: &JourneyOption) -> Self {
        let legs: Vec<LegView> = option.legs.iter().map(LegView::from).collect();
        Self {
            state: Some(option.display_value()),
            attributes: OptionAttributes {
                route_name: route.to_string(),
                option_index: slot,
                journey: Some(JourneyAttributes {
                    leave_time: option.leave_time.clone(),
                    arrive_time: option.arrive_time.clone(),
                    travel_time: option.travel_time.clone(),
                    from: data.from_location.clone(),
                    to: data.to_location.clone(),
                    date: data.date.clone(),
                    time: data.time.clone(),
                    leg_count: legs.len(),
                    legs,
                }),
            },
        }
    }

    pub fn is_available(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::LegType;
    use chrono::NaiveDate;
    use serde_json::json;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 3)
            .unwrap()
            .and_hms_opt(7, 30, 0)
            .unwrap()
    }

    fn data() -> JourneyData {
        JourneyData {
            options: vec![JourneyOption {
                leave_time: "7:42am".into(),
                arrive_time: "8:51am".into(),
                travel_time: "69 mins".into(),
                legs: vec![
                    JourneyLeg {
                        leg_type: LegType::Walk,
                        description: "Stop 10361 (5 mins)".into(),
                        service_code: None,
                    },
                    JourneyLeg {
                        leg_type: LegType::Bus,
                        description: "276 Bus 276 (12 mins)".into(),
                        service_code: Some("276".into()),
                    },
                ],
                index: 1,
            }],
            from_location: "Perth Busport".into(),
            to_location: "Curtin University".into(),
            date: "2026-01-03".into(),
            time: "07:30".into(),
        }
    }

    #[test]
    fn failure_drops_data_but_keeps_status() {
        let mut snapshot = Snapshot::new(at());
        snapshot.insert("work", data(), at());
        snapshot.fail("work", ErrorKind::Transport, "request timed out".into(), at());

        assert!(snapshot.get("work").is_none());
        assert!(snapshot.is_empty());
        let status = snapshot.status("work").unwrap();
        assert!(!status.is_ok());
        assert_eq!(status.attempted_at(), at());
    }

    #[test]
    fn option_view_carries_full_bundle() {
        let mut snapshot = Snapshot::new(at());
        snapshot.insert("work", data(), at());

        let view = snapshot.option_view("work", 1);
        assert!(view.is_available());
        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            json!({
                "state": "7:42am → 8:51am",
                "attributes": {
                    "route_name": "work",
                    "option_index": 1,
                    "leave_time": "7:42am",
                    "arrive_time": "8:51am",
                    "travel_time": "69 mins",
                    "from": "Perth Busport",
                    "to": "Curtin University",
                    "date": "2026-01-03",
                    "time": "07:30",
                    "legs": [
                        {"type": "walk", "description": "Stop 10361 (5 mins)", "service_code": null},
                        {"type": "bus", "description": "276 Bus 276 (12 mins)", "service_code": "276"}
                    ],
                    "leg_count": 2
                }
            })
        );
    }

    #[test]
    fn empty_slots_only_identify_themselves() {
        let mut snapshot = Snapshot::new(at());
        snapshot.insert("work", data(), at());

        for view in [snapshot.option_view("work", 2), snapshot.option_view("gym", 1)] {
            assert!(!view.is_available());
            let value = serde_json::to_value(&view).unwrap();
            assert_eq!(value["state"], serde_json::Value::Null);
            assert_eq!(value["attributes"].as_object().unwrap().len(), 2);
        }
    }
}
