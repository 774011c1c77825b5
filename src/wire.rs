//! Translation between the internal camelCase model and the record API's
//! snake_case wire records.
//!
//! Wire conventions:
//! - the display label lives in `Name`, the key in `Id`
//! - id sets (`parent_ids`, `student_ids`) travel as comma-separated strings
//! - reference fields arrive either as a bare id or as a lookup `{ "Id", "Name" }`
//! - absent scalars read back as empty strings / zero

use anyhow::{anyhow, Context};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::model::{
    parse_date, Announcement, AnnouncementPatch, Assignment, AssignmentPatch, AttendancePatch,
    AttendanceRecord, ClassPatch, ClassSection, Grade, GradePatch, Id, ScheduleEntry,
    SchedulePatch, Student, StudentPatch,
};
use crate::store::Entity;

pub type WireMap = Map<String, Value>;

pub trait WireEntity: Entity {
    /// Record API table name.
    const TABLE: &'static str;

    fn to_wire(&self) -> WireMap;
    fn from_wire(value: &Value) -> anyhow::Result<Self>;
    fn patch_to_wire(patch: &Self::Patch) -> WireMap;
}

struct WireReader<'a> {
    map: &'a WireMap,
}

impl<'a> WireReader<'a> {
    fn new(value: &'a Value) -> anyhow::Result<Self> {
        let map = value
            .as_object()
            .ok_or_else(|| anyhow!("wire record is not an object"))?;
        Ok(Self { map })
    }

    fn id(&self) -> anyhow::Result<Id> {
        match self.map.get("Id").and_then(as_id) {
            Some(id) if id > 0 => Ok(id),
            _ => Err(anyhow!("wire record has no positive Id")),
        }
    }

    fn str(&self, key: &str) -> String {
        match self.map.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    fn int(&self, key: &str) -> i64 {
        self.map.get(key).and_then(as_id).unwrap_or(0)
    }

    fn float(&self, key: &str) -> f64 {
        match self.map.get(key) {
            Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn bool(&self, key: &str) -> bool {
        match self.map.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_i64().unwrap_or(0) != 0,
            Some(Value::String(s)) => matches!(s.trim(), "true" | "1"),
            _ => false,
        }
    }

    fn reference(&self, key: &str) -> Id {
        match self.map.get(key) {
            Some(Value::Object(lookup)) => lookup.get("Id").and_then(as_id).unwrap_or(0),
            Some(v) => as_id(v).unwrap_or(0),
            None => 0,
        }
    }

    fn id_set(&self, key: &str) -> BTreeSet<Id> {
        match self.map.get(key) {
            Some(Value::String(s)) => split_ids(s),
            Some(Value::Array(items)) => items.iter().filter_map(as_id).collect(),
            _ => BTreeSet::new(),
        }
    }

    fn parsed<T: std::str::FromStr + Default>(&self, key: &str) -> anyhow::Result<T>
    where
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        let raw = self.str(key);
        if raw.trim().is_empty() {
            return Ok(T::default());
        }
        raw.parse::<T>().with_context(|| format!("wire field {key}"))
    }
}

fn as_id(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn split_ids(raw: &str) -> BTreeSet<Id> {
    raw.split(',')
        .filter_map(|part| part.trim().parse::<Id>().ok())
        .collect()
}

fn join_ids(ids: &BTreeSet<Id>) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

/// Keeps every fractional digit the timestamp has, so a stored record reads
/// back equal to what was written.
fn timestamp_to_wire(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// RFC 3339 timestamps, or a bare date taken as midnight UTC. Empty reads as
/// the epoch.
fn parse_timestamp(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    let t = raw.trim();
    if t.is_empty() {
        return Ok(DateTime::<Utc>::default());
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(t) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(t, "%Y-%m-%d")
        .with_context(|| format!("invalid timestamp {t:?}"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .ok_or_else(|| anyhow!("invalid timestamp {t:?}"))
}

fn put<V: Into<Value>>(map: &mut WireMap, key: &str, value: Option<V>) {
    if let Some(v) = value {
        map.insert(key.to_string(), v.into());
    }
}

impl WireEntity for Student {
    const TABLE: &'static str = "student";

    fn to_wire(&self) -> WireMap {
        let mut m = WireMap::new();
        m.insert("Name".into(), self.name.clone().into());
        m.insert("email".into(), self.email.clone().into());
        m.insert("grade".into(), self.grade.into());
        m.insert("section".into(), self.section.clone().into());
        m.insert("roll_number".into(), self.roll_number.clone().into());
        m.insert("phone".into(), self.phone.clone().into());
        m.insert("address".into(), self.address.clone().into());
        m.insert("date_of_birth".into(), self.date_of_birth.clone().into());
        m.insert("parent_ids".into(), join_ids(&self.parent_ids).into());
        m.insert("profile_picture".into(), self.profile_picture.clone().into());
        m
    }

    fn from_wire(value: &Value) -> anyhow::Result<Self> {
        let r = WireReader::new(value)?;
        Ok(Student {
            id: r.id()?,
            name: r.str("Name"),
            email: r.str("email"),
            grade: r.int("grade"),
            section: r.str("section"),
            roll_number: r.str("roll_number"),
            phone: r.str("phone"),
            address: r.str("address"),
            date_of_birth: r.str("date_of_birth"),
            parent_ids: r.id_set("parent_ids"),
            profile_picture: r.str("profile_picture"),
        })
    }

    fn patch_to_wire(p: &StudentPatch) -> WireMap {
        let mut m = WireMap::new();
        put(&mut m, "Name", p.name.clone());
        put(&mut m, "email", p.email.clone());
        put(&mut m, "grade", p.grade);
        put(&mut m, "section", p.section.clone());
        put(&mut m, "roll_number", p.roll_number.clone());
        put(&mut m, "phone", p.phone.clone());
        put(&mut m, "address", p.address.clone());
        put(&mut m, "date_of_birth", p.date_of_birth.clone());
        put(&mut m, "parent_ids", p.parent_ids.as_ref().map(join_ids));
        put(&mut m, "profile_picture", p.profile_picture.clone());
        m
    }
}

impl WireEntity for ClassSection {
    const TABLE: &'static str = "class";

    fn to_wire(&self) -> WireMap {
        let mut m = WireMap::new();
        m.insert("Name".into(), self.name.clone().into());
        m.insert("subject".into(), self.subject.clone().into());
        m.insert("teacher_id".into(), self.teacher_id.clone().into());
        m.insert("teacher".into(), self.teacher.clone().into());
        m.insert("grade".into(), self.grade.into());
        m.insert("section".into(), self.section.clone().into());
        m.insert("student_ids".into(), join_ids(&self.student_ids).into());
        m.insert("schedule".into(), self.schedule.clone().into());
        m.insert("room".into(), self.room.clone().into());
        m.insert("description".into(), self.description.clone().into());
        m
    }

    fn from_wire(value: &Value) -> anyhow::Result<Self> {
        let r = WireReader::new(value)?;
        Ok(ClassSection {
            id: r.id()?,
            name: r.str("Name"),
            subject: r.str("subject"),
            teacher_id: r.str("teacher_id"),
            teacher: r.str("teacher"),
            grade: r.int("grade"),
            section: r.str("section"),
            student_ids: r.id_set("student_ids"),
            schedule: r.str("schedule"),
            room: r.str("room"),
            description: r.str("description"),
        })
    }

    fn patch_to_wire(p: &ClassPatch) -> WireMap {
        let mut m = WireMap::new();
        put(&mut m, "Name", p.name.clone());
        put(&mut m, "subject", p.subject.clone());
        put(&mut m, "teacher_id", p.teacher_id.clone());
        put(&mut m, "teacher", p.teacher.clone());
        put(&mut m, "grade", p.grade);
        put(&mut m, "section", p.section.clone());
        put(&mut m, "student_ids", p.student_ids.as_ref().map(join_ids));
        put(&mut m, "schedule", p.schedule.clone());
        put(&mut m, "room", p.room.clone());
        put(&mut m, "description", p.description.clone());
        m
    }
}

impl WireEntity for AttendanceRecord {
    const TABLE: &'static str = "attendance";

    fn to_wire(&self) -> WireMap {
        let mut m = WireMap::new();
        m.insert("Name".into(), self.name.clone().into());
        m.insert("date".into(), self.date.to_string().into());
        m.insert("status".into(), self.status.as_str().into());
        m.insert("notes".into(), self.notes.clone().into());
        m.insert("student_id".into(), self.student_id.into());
        m.insert("class_id".into(), self.class_id.into());
        m
    }

    fn from_wire(value: &Value) -> anyhow::Result<Self> {
        let r = WireReader::new(value)?;
        Ok(AttendanceRecord {
            id: r.id()?,
            name: r.str("Name"),
            student_id: r.reference("student_id"),
            date: parse_date(&r.str("date"))?,
            status: r.parsed("status")?,
            class_id: r.reference("class_id"),
            notes: r.str("notes"),
        })
    }

    fn patch_to_wire(p: &AttendancePatch) -> WireMap {
        let mut m = WireMap::new();
        put(&mut m, "Name", p.name.clone());
        put(&mut m, "date", p.date.map(|d| d.to_string()));
        put(&mut m, "status", p.status.map(|s| s.as_str()));
        put(&mut m, "notes", p.notes.clone());
        put(&mut m, "student_id", p.student_id);
        put(&mut m, "class_id", p.class_id);
        m
    }
}

impl WireEntity for Assignment {
    const TABLE: &'static str = "assignment";

    fn to_wire(&self) -> WireMap {
        let mut m = WireMap::new();
        m.insert("Name".into(), self.name.clone().into());
        m.insert("title".into(), self.title.clone().into());
        m.insert("subject".into(), self.subject.clone().into());
        m.insert("due_date".into(), self.due_date.clone().into());
        m.insert("total_points".into(), self.total_points.into());
        m.insert("description".into(), self.description.clone().into());
        m.insert("type".into(), self.kind.clone().into());
        m.insert("created_at".into(), timestamp_to_wire(&self.created_at).into());
        m.insert("class_id".into(), self.class_id.into());
        m
    }

    fn from_wire(value: &Value) -> anyhow::Result<Self> {
        let r = WireReader::new(value)?;
        Ok(Assignment {
            id: r.id()?,
            name: r.str("Name"),
            title: r.str("title"),
            subject: r.str("subject"),
            due_date: r.str("due_date"),
            total_points: r.float("total_points"),
            description: r.str("description"),
            kind: r.str("type"),
            class_id: r.reference("class_id"),
            created_at: parse_timestamp(&r.str("created_at"))?,
        })
    }

    fn patch_to_wire(p: &AssignmentPatch) -> WireMap {
        let mut m = WireMap::new();
        put(&mut m, "Name", p.name.clone());
        put(&mut m, "title", p.title.clone());
        put(&mut m, "subject", p.subject.clone());
        put(&mut m, "due_date", p.due_date.clone());
        put(&mut m, "total_points", p.total_points);
        put(&mut m, "description", p.description.clone());
        put(&mut m, "type", p.kind.clone());
        put(&mut m, "class_id", p.class_id);
        m
    }
}

impl WireEntity for Grade {
    const TABLE: &'static str = "grade";

    fn to_wire(&self) -> WireMap {
        let mut m = WireMap::new();
        m.insert("Name".into(), self.name.clone().into());
        m.insert("score".into(), self.score.into());
        m.insert("submitted_date".into(), self.submitted_date.clone().into());
        m.insert("feedback".into(), self.feedback.clone().into());
        m.insert("graded_date".into(), self.graded_date.clone().into());
        m.insert("student_id".into(), self.student_id.into());
        m.insert("assignment_id".into(), self.assignment_id.into());
        m
    }

    fn from_wire(value: &Value) -> anyhow::Result<Self> {
        let r = WireReader::new(value)?;
        Ok(Grade {
            id: r.id()?,
            name: r.str("Name"),
            student_id: r.reference("student_id"),
            assignment_id: r.reference("assignment_id"),
            score: r.float("score"),
            submitted_date: r.str("submitted_date"),
            graded_date: r.str("graded_date"),
            feedback: r.str("feedback"),
        })
    }

    fn patch_to_wire(p: &GradePatch) -> WireMap {
        let mut m = WireMap::new();
        put(&mut m, "Name", p.name.clone());
        put(&mut m, "score", p.score);
        put(&mut m, "submitted_date", p.submitted_date.clone());
        put(&mut m, "feedback", p.feedback.clone());
        put(&mut m, "graded_date", p.graded_date.clone());
        put(&mut m, "student_id", p.student_id);
        put(&mut m, "assignment_id", p.assignment_id);
        m
    }
}

impl WireEntity for Announcement {
    const TABLE: &'static str = "announcement";

    fn to_wire(&self) -> WireMap {
        let mut m = WireMap::new();
        m.insert("Name".into(), self.name.clone().into());
        m.insert("title".into(), self.title.clone().into());
        m.insert("content".into(), self.content.clone().into());
        m.insert("author_id".into(), self.author_id.clone().into());
        m.insert("target_audience".into(), self.target_audience.as_str().into());
        m.insert("created_at".into(), timestamp_to_wire(&self.created_at).into());
        m.insert("priority".into(), self.priority.as_str().into());
        m.insert("is_active".into(), self.is_active.into());
        m
    }

    fn from_wire(value: &Value) -> anyhow::Result<Self> {
        let r = WireReader::new(value)?;
        Ok(Announcement {
            id: r.id()?,
            name: r.str("Name"),
            title: r.str("title"),
            content: r.str("content"),
            author_id: r.str("author_id"),
            target_audience: r.parsed("target_audience")?,
            created_at: parse_timestamp(&r.str("created_at"))?,
            priority: r.parsed("priority")?,
            is_active: r.bool("is_active"),
        })
    }

    fn patch_to_wire(p: &AnnouncementPatch) -> WireMap {
        let mut m = WireMap::new();
        put(&mut m, "Name", p.name.clone());
        put(&mut m, "title", p.title.clone());
        put(&mut m, "content", p.content.clone());
        put(&mut m, "author_id", p.author_id.clone());
        put(&mut m, "target_audience", p.target_audience.map(|a| a.as_str()));
        put(&mut m, "priority", p.priority.map(|pr| pr.as_str()));
        put(&mut m, "is_active", p.is_active);
        m
    }
}

impl WireEntity for ScheduleEntry {
    const TABLE: &'static str = "schedule";

    fn to_wire(&self) -> WireMap {
        let mut m = WireMap::new();
        m.insert("Name".into(), self.name.clone().into());
        m.insert("day".into(), self.day.clone().into());
        m.insert("time".into(), self.time.clone().into());
        m.insert("subject".into(), self.subject.clone().into());
        m.insert("teacher".into(), self.teacher.clone().into());
        m.insert("room".into(), self.room.clone().into());
        m.insert("class_id".into(), self.class_id.into());
        m
    }

    fn from_wire(value: &Value) -> anyhow::Result<Self> {
        let r = WireReader::new(value)?;
        Ok(ScheduleEntry {
            id: r.id()?,
            name: r.str("Name"),
            day: r.str("day"),
            time: r.str("time"),
            subject: r.str("subject"),
            teacher: r.str("teacher"),
            room: r.str("room"),
            class_id: r.reference("class_id"),
        })
    }

    fn patch_to_wire(p: &SchedulePatch) -> WireMap {
        let mut m = WireMap::new();
        put(&mut m, "Name", p.name.clone());
        put(&mut m, "day", p.day.clone());
        put(&mut m, "time", p.time.clone());
        put(&mut m, "subject", p.subject.clone());
        put(&mut m, "teacher", p.teacher.clone());
        put(&mut m, "room", p.room.clone());
        put(&mut m, "class_id", p.class_id);
        m
    }
}
