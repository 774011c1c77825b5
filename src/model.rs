use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ServiceError;

pub type Id = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    #[default]
    Present,
    Absent,
    Late,
    Excused,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Late => "late",
            AttendanceStatus::Excused => "excused",
        }
    }
}

impl FromStr for AttendanceStatus {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "present" => Ok(AttendanceStatus::Present),
            "absent" => Ok(AttendanceStatus::Absent),
            "late" => Ok(AttendanceStatus::Late),
            "excused" => Ok(AttendanceStatus::Excused),
            _ => Err(ServiceError::InvalidStatus(s.to_string())),
        }
    }
}

impl fmt::Display for AttendanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    All,
    Teachers,
    Students,
    Parents,
    Class,
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::All => "all",
            Audience::Teachers => "teachers",
            Audience::Students => "students",
            Audience::Parents => "parents",
            Audience::Class => "class",
        }
    }
}

impl FromStr for Audience {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Audience::All),
            "teachers" => Ok(Audience::Teachers),
            "students" => Ok(Audience::Students),
            "parents" => Ok(Audience::Parents),
            "class" => Ok(Audience::Class),
            _ => Err(ServiceError::InvalidAudience(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(ServiceError::InvalidPriority(s.to_string())),
        }
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ServiceError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| ServiceError::InvalidDate {
        value: raw.to_string(),
    })
}

fn default_true() -> bool {
    true
}

// Entities. The camelCase serde shape is the internal/IPC shape; the wire
// shape lives in `wire`.

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Student {
    #[serde(rename = "Id")]
    pub id: Id,
    pub name: String,
    pub email: String,
    pub grade: i64,
    pub section: String,
    pub roll_number: String,
    pub phone: String,
    pub address: String,
    pub date_of_birth: String,
    pub parent_ids: BTreeSet<Id>,
    pub profile_picture: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassSection {
    #[serde(rename = "Id")]
    pub id: Id,
    pub name: String,
    pub subject: String,
    pub teacher_id: String,
    pub teacher: String,
    pub grade: i64,
    pub section: String,
    pub student_ids: BTreeSet<Id>,
    pub schedule: String,
    pub room: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    #[serde(rename = "Id", default)]
    pub id: Id,
    #[serde(default)]
    pub name: String,
    pub student_id: Id,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: AttendanceStatus,
    /// 0 when the record is not tied to a class.
    #[serde(default)]
    pub class_id: Id,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    #[serde(rename = "Id", default)]
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub due_date: String,
    #[serde(default)]
    pub total_points: f64,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub class_id: Id,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Grade {
    #[serde(rename = "Id")]
    pub id: Id,
    pub name: String,
    pub student_id: Id,
    pub assignment_id: Id,
    pub score: f64,
    pub submitted_date: String,
    pub graded_date: String,
    pub feedback: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "Id", default)]
    pub id: Id,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author_id: String,
    #[serde(default)]
    pub target_audience: Audience,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleEntry {
    #[serde(rename = "Id")]
    pub id: Id,
    pub name: String,
    pub day: String,
    pub time: String,
    pub subject: String,
    pub teacher: String,
    pub room: String,
    pub class_id: Id,
}

// Patches: `Some` fields are merged into the stored record, `None` fields are
// left untouched.

fn merge<T>(slot: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *slot = v;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StudentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub grade: Option<i64>,
    pub section: Option<String>,
    pub roll_number: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub date_of_birth: Option<String>,
    pub parent_ids: Option<BTreeSet<Id>>,
    pub profile_picture: Option<String>,
}

impl StudentPatch {
    pub fn apply(self, s: &mut Student) {
        merge(&mut s.name, self.name);
        merge(&mut s.email, self.email);
        merge(&mut s.grade, self.grade);
        merge(&mut s.section, self.section);
        merge(&mut s.roll_number, self.roll_number);
        merge(&mut s.phone, self.phone);
        merge(&mut s.address, self.address);
        merge(&mut s.date_of_birth, self.date_of_birth);
        merge(&mut s.parent_ids, self.parent_ids);
        merge(&mut s.profile_picture, self.profile_picture);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClassPatch {
    pub name: Option<String>,
    pub subject: Option<String>,
    pub teacher_id: Option<String>,
    pub teacher: Option<String>,
    pub grade: Option<i64>,
    pub section: Option<String>,
    pub student_ids: Option<BTreeSet<Id>>,
    pub schedule: Option<String>,
    pub room: Option<String>,
    pub description: Option<String>,
}

impl ClassPatch {
    pub fn apply(self, c: &mut ClassSection) {
        merge(&mut c.name, self.name);
        merge(&mut c.subject, self.subject);
        merge(&mut c.teacher_id, self.teacher_id);
        merge(&mut c.teacher, self.teacher);
        merge(&mut c.grade, self.grade);
        merge(&mut c.section, self.section);
        merge(&mut c.student_ids, self.student_ids);
        merge(&mut c.schedule, self.schedule);
        merge(&mut c.room, self.room);
        merge(&mut c.description, self.description);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AttendancePatch {
    pub name: Option<String>,
    pub student_id: Option<Id>,
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub class_id: Option<Id>,
    pub notes: Option<String>,
}

impl AttendancePatch {
    pub fn apply(self, a: &mut AttendanceRecord) {
        merge(&mut a.name, self.name);
        merge(&mut a.student_id, self.student_id);
        merge(&mut a.date, self.date);
        merge(&mut a.status, self.status);
        merge(&mut a.class_id, self.class_id);
        merge(&mut a.notes, self.notes);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssignmentPatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub subject: Option<String>,
    pub due_date: Option<String>,
    pub total_points: Option<f64>,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub class_id: Option<Id>,
}

impl AssignmentPatch {
    pub fn apply(self, a: &mut Assignment) {
        merge(&mut a.name, self.name);
        merge(&mut a.title, self.title);
        merge(&mut a.subject, self.subject);
        merge(&mut a.due_date, self.due_date);
        merge(&mut a.total_points, self.total_points);
        merge(&mut a.description, self.description);
        merge(&mut a.kind, self.kind);
        merge(&mut a.class_id, self.class_id);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GradePatch {
    pub name: Option<String>,
    pub student_id: Option<Id>,
    pub assignment_id: Option<Id>,
    pub score: Option<f64>,
    pub submitted_date: Option<String>,
    pub graded_date: Option<String>,
    pub feedback: Option<String>,
}

impl GradePatch {
    pub fn apply(self, g: &mut Grade) {
        merge(&mut g.name, self.name);
        merge(&mut g.student_id, self.student_id);
        merge(&mut g.assignment_id, self.assignment_id);
        merge(&mut g.score, self.score);
        merge(&mut g.submitted_date, self.submitted_date);
        merge(&mut g.graded_date, self.graded_date);
        merge(&mut g.feedback, self.feedback);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AnnouncementPatch {
    pub name: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub author_id: Option<String>,
    pub target_audience: Option<Audience>,
    pub priority: Option<Priority>,
    pub is_active: Option<bool>,
}

impl AnnouncementPatch {
    pub fn apply(self, a: &mut Announcement) {
        merge(&mut a.name, self.name);
        merge(&mut a.title, self.title);
        merge(&mut a.content, self.content);
        merge(&mut a.author_id, self.author_id);
        merge(&mut a.target_audience, self.target_audience);
        merge(&mut a.priority, self.priority);
        merge(&mut a.is_active, self.is_active);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SchedulePatch {
    pub name: Option<String>,
    pub day: Option<String>,
    pub time: Option<String>,
    pub subject: Option<String>,
    pub teacher: Option<String>,
    pub room: Option<String>,
    pub class_id: Option<Id>,
}

impl SchedulePatch {
    pub fn apply(self, e: &mut ScheduleEntry) {
        merge(&mut e.name, self.name);
        merge(&mut e.day, self.day);
        merge(&mut e.time, self.time);
        merge(&mut e.subject, self.subject);
        merge(&mut e.teacher, self.teacher);
        merge(&mut e.room, self.room);
        merge(&mut e.class_id, self.class_id);
    }
}
