use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::gateway::Backend;
use crate::model::{Announcement, AttendanceRecord, ClassSection, Student};
use crate::services::announcements::{recent_announcements, DEFAULT_RECENT_DAYS};
use crate::services::attendance::attendance_stats;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_students: usize,
    pub total_classes: usize,
    pub attendance_rate: u32,
    /// Announcements from the last week.
    pub active_announcements: usize,
}

pub fn summary(backend: &mut Backend, now: DateTime<Utc>) -> DashboardSummary {
    let total_students = backend.list::<Student>().len();
    let total_classes = backend.list::<ClassSection>().len();
    let attendance = backend.list::<AttendanceRecord>();
    let announcements = backend.list::<Announcement>();
    DashboardSummary {
        total_students,
        total_classes,
        attendance_rate: attendance_stats(&attendance, None).attendance_rate,
        active_announcements: recent_announcements(announcements, DEFAULT_RECENT_DAYS, now).len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn summarises_seeded_store() {
        let mut backend = Backend::Memory(MemoryStore::seeded().expect("seed"));
        let now = DateTime::parse_from_rfc3339("2024-01-16T00:00:00Z")
            .expect("ts")
            .with_timezone(&Utc);
        let s = summary(&mut backend, now);
        assert_eq!(s.total_students, 6);
        assert_eq!(s.total_classes, 4);
        // 3 of 6 seeded records are present
        assert_eq!(s.attendance_rate, 50);
        // all three seeded announcements fall in the week before the 16th
        assert_eq!(s.active_announcements, 3);
    }

    #[test]
    fn empty_store_summary_is_all_zero() {
        let mut backend = Backend::Memory(MemoryStore::new());
        let s = summary(&mut backend, Utc::now());
        assert_eq!(
            s,
            DashboardSummary {
                total_students: 0,
                total_classes: 0,
                attendance_rate: 0,
                active_announcements: 0,
            }
        );
    }
}
