//! Normalized journey results.
//!
//! These are rebuilt from scratch on every poll. Times and durations are
//! kept as the planner's display strings; nothing here reformats them.

use std::fmt;

/// Kind of transit segment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LegType {
    #[default]
    Walk,
    Bus,
    Train,
    Ferry,
    /// Perth's free CAT buses
    Cat,
}

impl LegType {
    pub fn as_str(self) -> &'static str {
        match self {
            LegType::Walk => "walk",
            LegType::Bus => "bus",
            LegType::Train => "train",
            LegType::Ferry => "ferry",
            LegType::Cat => "cat",
        }
    }
}

impl fmt::Display for LegType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One homogeneous-mode segment of a journey.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyLeg {
    pub leg_type: LegType,
    /// e.g. "276 Bus 276 (12 mins)" or "Walk 501m"
    pub description: String,
    /// Line number or name, e.g. "276", "AIR", "Red"
    pub service_code: Option<String>,
}

/// One candidate trip as ranked by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyOption {
    pub leave_time: String,
    pub arrive_time: String,
    /// e.g. "69 mins"
    pub travel_time: String,
    /// May be empty if every leg failed to parse.
    pub legs: Vec<JourneyLeg>,
    /// 1-based position in the planner's ranking.
    pub index: u32,
}

impl JourneyOption {
    /// Short state string, e.g. "7:42am → 8:51am".
    pub fn display_value(&self) -> String {
        format!("{} → {}", self.leave_time, self.arrive_time)
    }
}

/// Result of fetching one route, echoing the parameters it was fetched with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyData {
    /// Best first, in planner order.
    pub options: Vec<JourneyOption>,
    pub from_location: String,
    pub to_location: String,
    pub date: String,
    pub time: String,
}

impl JourneyData {
    /// Look up an option by its 1-based slot.
    pub fn option(&self, slot: usize) -> Option<&JourneyOption> {
        slot.checked_sub(1).and_then(|i| self.options.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(leave: &str, arrive: &str) -> JourneyOption {
        JourneyOption {
            leave_time: leave.into(),
            arrive_time: arrive.into(),
            travel_time: "69 mins".into(),
            legs: vec![],
            index: 1,
        }
    }

    #[test]
    fn display_value_uses_arrow() {
        assert_eq!(option("7:42am", "8:51am").display_value(), "7:42am → 8:51am");
    }

    #[test]
    fn option_slots_are_one_based() {
        let data = JourneyData {
            options: vec![option("7:42am", "8:51am"), option("7:57am", "9:06am")],
            from_location: "A".into(),
            to_location: "B".into(),
            date: "2026-01-03".into(),
            time: "07:30".into(),
        };

        assert!(data.option(0).is_none());
        assert_eq!(data.option(1).unwrap().leave_time, "7:42am");
        assert_eq!(data.option(2).unwrap().leave_time, "7:57am");
        assert!(data.option(3).is_none());
    }

    #[test]
    fn leg_type_names() {
        assert_eq!(LegType::default(), LegType::Walk);
        assert_eq!(LegType::Cat.to_string(), "cat");
    }
}
