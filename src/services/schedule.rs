use chrono::Weekday;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::model::ScheduleEntry;

pub const SCHOOL_DAYS: [Weekday; 5] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn by_time(mut entries: Vec<ScheduleEntry>) -> Vec<ScheduleEntry> {
    entries.sort_by(|a, b| a.time.cmp(&b.time));
    entries
}

pub fn day_schedule(entries: &[ScheduleEntry], day: Weekday) -> Vec<ScheduleEntry> {
    let name = weekday_name(day);
    by_time(entries.iter().filter(|e| e.day == name).cloned().collect())
}

/// One school week, Monday first. Serializes as a map keyed by day name in
/// that order.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySchedule {
    days: Vec<(&'static str, Vec<ScheduleEntry>)>,
}

#[cfg(test)]
impl WeeklySchedule {
    pub fn day(&self, name: &str) -> Option<&[ScheduleEntry]> {
        self.days
            .iter()
            .find(|(d, _)| *d == name)
            .map(|(_, entries)| entries.as_slice())
    }

    pub fn day_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.days.iter().map(|(d, _)| *d)
    }
}

impl Serialize for WeeklySchedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for (day, entries) in &self.days {
            map.serialize_entry(day, entries)?;
        }
        map.end()
    }
}

/// Monday through Friday, each day's entries ordered by start time.
pub fn weekly_schedule(entries: &[ScheduleEntry]) -> WeeklySchedule {
    WeeklySchedule {
        days: SCHOOL_DAYS
            .iter()
            .map(|&day| (weekday_name(day), day_schedule(entries, day)))
            .collect(),
    }
}
