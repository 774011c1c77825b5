use anyhow::Context;
use serde::Deserialize;

use crate::model::{
    Announcement, AnnouncementPatch, Assignment, AssignmentPatch, AttendancePatch,
    AttendanceRecord, ClassPatch, ClassSection, Grade, GradePatch, Id, ScheduleEntry,
    SchedulePatch, Student, StudentPatch,
};

const SEED_FIXTURES: &str = include_str!("../fixtures/seed.json");

/// A record type held by the store.
pub trait Entity: Clone + std::fmt::Debug {
    type Patch;

    /// Result key for list responses ("students", "classes", ...).
    const PLURAL: &'static str;
    /// Result key for single-record responses.
    const SINGULAR: &'static str;

    fn id(&self) -> Id;
    fn set_id(&mut self, id: Id);
    fn apply_patch(&mut self, patch: Self::Patch);

    /// Fills derived values (display names, stamp dates) left empty by the caller.
    fn fill_defaults(&mut self) {}

    fn collection(store: &mut MemoryStore) -> &mut Collection<Self>;
}

/// One ordered collection. Reads hand out clones and writes store clones, so
/// nothing outside the collection can reach a stored value.
#[derive(Debug, Clone)]
pub struct Collection<E> {
    rows: Vec<E>,
}

impl<E> Default for Collection<E> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<E: Entity> Collection<E> {
    pub fn from_rows(rows: Vec<E>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn next_id(&self) -> Id {
        self.rows.iter().map(Entity::id).max().map_or(1, |max| max + 1)
    }

    pub fn list(&self) -> Vec<E> {
        self.rows.clone()
    }

    pub fn get(&self, id: Id) -> Option<E> {
        self.rows.iter().find(|r| r.id() == id).cloned()
    }

    pub fn create(&mut self, mut record: E) -> E {
        record.fill_defaults();
        record.set_id(self.next_id());
        self.rows.push(record.clone());
        record
    }

    pub fn update(&mut self, id: Id, patch: E::Patch) -> Option<E> {
        let row = self.rows.iter_mut().find(|r| r.id() == id)?;
        row.apply_patch(patch);
        Some(row.clone())
    }

    pub fn delete(&mut self, id: Id) -> Option<E> {
        let pos = self.rows.iter().position(|r| r.id() == id)?;
        Some(self.rows.remove(pos))
    }
}

/// Local-mode record store: one collection per entity type.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub students: Collection<Student>,
    pub classes: Collection<ClassSection>,
    pub attendance: Collection<AttendanceRecord>,
    pub assignments: Collection<Assignment>,
    pub grades: Collection<Grade>,
    pub announcements: Collection<Announcement>,
    pub schedule: Collection<ScheduleEntry>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Fixtures {
    students: Vec<Student>,
    classes: Vec<ClassSection>,
    attendance: Vec<AttendanceRecord>,
    assignments: Vec<Assignment>,
    grades: Vec<Grade>,
    announcements: Vec<Announcement>,
    schedule: Vec<ScheduleEntry>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the fixture set bundled into the binary.
    pub fn seeded() -> anyhow::Result<Self> {
        Self::from_fixtures(SEED_FIXTURES).context("bundled seed fixtures")
    }

    pub fn from_fixtures(raw: &str) -> anyhow::Result<Self> {
        let f: Fixtures = serde_json::from_str(raw).context("failed to parse fixtures")?;
        Ok(Self {
            students: Collection::from_rows(f.students),
            classes: Collection::from_rows(f.classes),
            attendance: Collection::from_rows(f.attendance),
            assignments: Collection::from_rows(f.assignments),
            grades: Collection::from_rows(f.grades),
            announcements: Collection::from_rows(f.announcements),
            schedule: Collection::from_rows(f.schedule),
        })
    }
}

impl Entity for Student {
    type Patch = StudentPatch;
    const PLURAL: &'static str = "students";
    const SINGULAR: &'static str = "student";

    fn id(&self) -> Id {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
    fn apply_patch(&mut self, patch: StudentPatch) {
        patch.apply(self);
    }
    fn collection(store: &mut MemoryStore) -> &mut Collection<Self> {
        &mut store.students
    }
}

impl Entity for ClassSection {
    type Patch = ClassPatch;
    const PLURAL: &'static str = "classes";
    const SINGULAR: &'static str = "class";

    fn id(&self) -> Id {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
    fn apply_patch(&mut self, patch: ClassPatch) {
        patch.apply(self);
    }
    fn collection(store: &mut MemoryStore) -> &mut Collection<Self> {
        &mut store.classes
    }
}

impl Entity for AttendanceRecord {
    type Patch = AttendancePatch;
    const PLURAL: &'static str = "attendance";
    const SINGULAR: &'static str = "attendance";

    fn id(&self) -> Id {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
    fn apply_patch(&mut self, patch: AttendancePatch) {
        patch.apply(self);
    }
    fn fill_defaults(&mut self) {
        if self.name.is_empty() {
            self.name = format!("Attendance for {}", self.date);
        }
    }
    fn collection(store: &mut MemoryStore) -> &mut Collection<Self> {
        &mut store.attendance
    }
}

impl Entity for Assignment {
    type Patch = AssignmentPatch;
    const PLURAL: &'static str = "assignments";
    const SINGULAR: &'static str = "assignment";

    fn id(&self) -> Id {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
    fn apply_patch(&mut self, patch: AssignmentPatch) {
        patch.apply(self);
    }
    fn fill_defaults(&mut self) {
        if self.name.is_empty() {
            self.name = self.title.clone();
        }
    }
    fn collection(store: &mut MemoryStore) -> &mut Collection<Self> {
        &mut store.assignments
    }
}

impl Entity for Grade {
    type Patch = GradePatch;
    const PLURAL: &'static str = "grades";
    const SINGULAR: &'static str = "grade";

    fn id(&self) -> Id {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
    fn apply_patch(&mut self, patch: GradePatch) {
        patch.apply(self);
    }
    fn fill_defaults(&mut self) {
        if self.name.is_empty() {
            self.name = format!("Grade for {}", self.student_id);
        }
        if self.graded_date.is_empty() {
            self.graded_date = chrono::Local::now().date_naive().to_string();
        }
    }
    fn collection(store: &mut MemoryStore) -> &mut Collection<Self> {
        &mut store.grades
    }
}

impl Entity for Announcement {
    type Patch = AnnouncementPatch;
    const PLURAL: &'static str = "announcements";
    const SINGULAR: &'static str = "announcement";

    fn id(&self) -> Id {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
    fn apply_patch(&mut self, patch: AnnouncementPatch) {
        patch.apply(self);
    }
    fn fill_defaults(&mut self) {
        if self.name.is_empty() {
            self.name = self.title.clone();
        }
    }
    fn collection(store: &mut MemoryStore) -> &mut Collection<Self> {
        &mut store.announcements
    }
}

impl Entity for ScheduleEntry {
    type Patch = SchedulePatch;
    const PLURAL: &'static str = "schedule";
    const SINGULAR: &'static str = "entry";

    fn id(&self) -> Id {
        self.id
    }
    fn set_id(&mut self, id: Id) {
        self.id = id;
    }
    fn apply_patch(&mut self, patch: SchedulePatch) {
        patch.apply(self);
    }
    fn fill_defaults(&mut self) {
        if self.name.is_empty() {
            self.name = format!("{} - {}", self.subject, self.day);
        }
    }
    fn collection(store: &mut MemoryStore) -> &mut Collection<Self> {
        &mut store.schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(name: &str) -> Student {
        Student {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn ids_start_at_one_and_follow_the_max() {
        let mut c: Collection<Student> = Collection::default();
        assert_eq!(c.create(student("a")).id, 1);
        assert_eq!(c.create(student("b")).id, 2);
        assert_eq!(c.create(student("c")).id, 3);
        c.delete(2).expect("delete 2");
        assert_eq!(c.create(student("d")).id, 4);
        c.delete(4).expect("delete 4");
        // max is 3 again, so the freed id is reused
        assert_eq!(c.create(student("e")).id, 4);
    }

    #[test]
    fn list_keeps_insertion_order() {
        let mut c = Collection::from_rows(vec![
            Student { id: 9, ..student("z") },
            Student { id: 2, ..student("y") },
        ]);
        c.create(student("x"));
        let ids: Vec<Id> = c.list().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![9, 2, 10]);
    }

    #[test]
    fn returned_values_are_copies() {
        let mut c: Collection<Student> = Collection::default();
        let mut created = c.create(student("Ada"));
        created.name = "changed".to_string();
        let mut listed = c.list();
        listed[0].name = "changed again".to_string();
        assert_eq!(c.get(1).expect("get").name, "Ada");
    }

    #[test]
    fn missing_ids_signal_not_found() {
        let mut c: Collection<Student> = Collection::default();
        assert!(c.get(1).is_none());
        assert!(c.update(1, StudentPatch::default()).is_none());
        assert!(c.delete(1).is_none());
    }

    #[test]
    fn delete_returns_removed_record() {
        let mut c: Collection<Student> = Collection::default();
        c.create(student("Ada"));
        let removed = c.delete(1).expect("removed");
        assert_eq!(removed.name, "Ada");
        assert!(c.is_empty());
    }

    #[test]
    fn schedule_entries_are_named_after_subject_and_day() {
        let mut c: Collection<ScheduleEntry> = Collection::default();
        let unnamed = c.create(ScheduleEntry {
            subject: "Biology".into(),
            day: "Tuesday".into(),
            time: "11:15".into(),
            ..Default::default()
        });
        assert_eq!(unnamed.name, "Biology - Tuesday");

        let named = c.create(ScheduleEntry {
            name: "Lab block".into(),
            subject: "Biology".into(),
            day: "Thursday".into(),
            ..Default::default()
        });
        assert_eq!(named.name, "Lab block");
    }

    #[test]
    fn bundled_fixtures_parse() {
        let store = MemoryStore::seeded().expect("seeded store");
        assert!(!store.students.is_empty());
        assert!(!store.classes.is_empty());
        assert!(!store.schedule.is_empty());
    }

    #[test]
    fn empty_fixture_sections_are_allowed() {
        let store = MemoryStore::from_fixtures(r#"{ "students": [] }"#).expect("fixtures");
        assert_eq!(store.grades.len(), 0);
    }
}
