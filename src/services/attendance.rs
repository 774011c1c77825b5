use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::ServiceError;
use crate::gateway::Repository;
use crate::model::{AttendancePatch, AttendanceRecord, AttendanceStatus, Id};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ServiceError> {
        if start > end {
            return Err(ServiceError::InvalidRange {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStats {
    pub total: usize,
    pub present: usize,
    pub absent: usize,
    pub late: usize,
    pub excused: usize,
    /// Whole percent of records marked present; 0 for an empty set.
    pub attendance_rate: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttendanceFilter {
    pub student_id: Option<Id>,
    pub date: Option<NaiveDate>,
    pub class_id: Option<Id>,
}

impl AttendanceFilter {
    fn matches(&self, r: &AttendanceRecord) -> bool {
        self.student_id.map_or(true, |id| r.student_id == id)
            && self.date.map_or(true, |d| r.date == d)
            && self.class_id.map_or(true, |id| r.class_id == id)
    }
}

/// Records one student's status for one day. An existing `(student, date)`
/// record is overwritten (its class kept unless a new one is given);
/// otherwise a fresh record is created.
///
/// Returns `None` only when the backend write fails.
pub fn mark_attendance(
    repo: &mut dyn Repository<AttendanceRecord>,
    student_id: Id,
    date: NaiveDate,
    status: AttendanceStatus,
    class_id: Option<Id>,
) -> Option<AttendanceRecord> {
    let existing = repo
        .list()
        .into_iter()
        .find(|r| r.student_id == student_id && r.date == date);

    match existing {
        Some(record) => {
            debug!(id = record.id, student_id, %date, %status, "updating attendance");
            repo.update(
                record.id,
                AttendancePatch {
                    status: Some(status),
                    class_id,
                    ..Default::default()
                },
            )
        }
        None => {
            debug!(student_id, %date, %status, "creating attendance");
            repo.create(AttendanceRecord {
                id: 0,
                name: format!("Attendance for {date}"),
                student_id,
                date,
                status,
                class_id: class_id.unwrap_or(0),
                notes: String::new(),
            })
        }
    }
}

pub fn filter_records(
    records: Vec<AttendanceRecord>,
    filter: &AttendanceFilter,
) -> Vec<AttendanceRecord> {
    records.into_iter().filter(|r| filter.matches(r)).collect()
}

pub fn attendance_stats(records: &[AttendanceRecord], range: Option<DateRange>) -> AttendanceStats {
    let mut stats = AttendanceStats::default();
    for r in records {
        if let Some(range) = range {
            if !range.contains(r.date) {
                continue;
            }
        }
        stats.total += 1;
        match r.status {
            AttendanceStatus::Present => stats.present += 1,
            AttendanceStatus::Absent => stats.absent += 1,
            AttendanceStatus::Late => stats.late += 1,
            AttendanceStatus::Excused => stats.excused += 1,
        }
    }
    if stats.total > 0 {
        stats.attendance_rate =
            (stats.present as f64 / stats.total as f64 * 100.0).round() as u32;
    }
    stats
}
