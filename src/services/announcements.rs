use chrono::{DateTime, Duration, Utc};

use crate::model::Announcement;

pub const DEFAULT_RECENT_DAYS: i64 = 7;
const MAX_RECENT_DAYS: i64 = 36_500;

/// Announcements created within the last `days` days, newest first.
pub fn recent_announcements(
    all: Vec<Announcement>,
    days: i64,
    now: DateTime<Utc>,
) -> Vec<Announcement> {
    let cutoff = now - Duration::days(days.clamp(0, MAX_RECENT_DAYS));
    let mut recent: Vec<Announcement> = all
        .into_iter()
        .filter(|a| a.created_at >= cutoff)
        .collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent
}
