//! Derived study statistics.
//!
//! Everything here is recomputed from the full session log. The computation
//! is pure and re-entrant: it takes an immutable slice of sessions, the
//! weekly goal and "now" in the caller's time zone.

mod cache;
mod dates;
mod heatmap;
mod streak;

use std::collections::HashMap;

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};

use crate::session::Session;

pub use cache::StatsCache;
pub use dates::{date_key, format_key, local_date, parse_key, week_start, DATE_KEY_FORMAT};
pub use heatmap::{activity_heatmap, intensity, ActivityHeatmap, HeatmapDay, HEATMAP_WEEKS};
pub use streak::{current_streak, daily_totals, qualifying_days, MIN_DAILY_TIME};

/// Number of sessions kept in [`StatsSnapshot::recent_sessions`].
pub const RECENT_SESSIONS: usize = 10;

/// Seconds studied on one subject during the current week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectTotal {
    /// `None` for sessions recorded without a subject.
    pub subject_id: Option<String>,
    pub seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub today_total: u64,
    pub week_total: u64,
    pub streak: u32,
    /// `week_total / weekly_goal`, `0.0` when no goal is set.
    pub weekly_progress: f64,
    /// Week-scoped, most studied first.
    pub subject_time: Vec<SubjectTotal>,
    /// Most recent first.
    pub recent_sessions: Vec<Session>,
}

impl StatsSnapshot {
    /// Seconds this week for one subject (`None` = sessions without one).
    pub fn subject_seconds(&self, subject_id: Option<&str>) -> u64 {
        self.subject_time
            .iter()
            .find(|t| t.subject_id.as_deref() == subject_id)
            .map(|t| t.seconds)
            .unwrap_or(0)
    }
}

/// Compute totals, streak and per-subject time as of `now`.
pub fn compute_stats<Tz: TimeZone>(
    sessions: &[Session],
    weekly_goal_secs: u64,
    now: &DateTime<Tz>,
) -> StatsSnapshot {
    let today = now.date_naive();
    let today_key = format_key(today);
    let week_key = format_key(week_start(today));

    let counted = || sessions.iter().filter(|s| s.duration > 0);

    let today_total = counted()
        .filter(|s| s.date == today_key)
        .map(|s| s.duration)
        .sum();

    let mut week_total = 0;
    let mut by_subject: HashMap<Option<&str>, u64> = HashMap::new();
    // Keys are zero-padded ISO dates, so string order is date order.
    for session in counted().filter(|s| s.date.as_str() >= week_key.as_str()) {
        week_total += session.duration;
        *by_subject.entry(session.subject_id.as_deref()).or_default() += session.duration;
    }

    let mut subject_time: Vec<SubjectTotal> = by_subject
        .into_iter()
        .map(|(subject_id, seconds)| SubjectTotal {
            subject_id: subject_id.map(str::to_owned),
            seconds,
        })
        .collect();
    subject_time.sort_by(|a, b| {
        b.seconds
            .cmp(&a.seconds)
            .then_with(|| a.subject_id.cmp(&b.subject_id))
    });

    let weekly_progress = if weekly_goal_secs == 0 {
        0.0
    } else {
        week_total as f64 / weekly_goal_secs as f64
    };

    let recent_sessions = sessions
        .iter()
        .rev()
        .take(RECENT_SESSIONS)
        .cloned()
        .collect();

    StatsSnapshot {
        today_total,
        week_total,
        streak: current_streak(sessions, today),
        weekly_progress,
        subject_time,
        recent_sessions,
    }
}
