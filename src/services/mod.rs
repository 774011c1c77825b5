pub mod announcements;
pub mod attendance;
pub mod dashboard;
pub mod grades;
pub mod schedule;
