pub mod announcements;
pub mod attendance;
pub mod core;
pub mod dashboard;
pub mod grades;
pub mod params;
pub mod records;
pub mod schedule;
