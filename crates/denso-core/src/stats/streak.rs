//! Consecutive-day study streaks.
//!
//! A streak stays alive until a full calendar day passes without a
//! qualifying day: today does not need to qualify yet, but if it does not,
//! counting starts from yesterday.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use super::dates::parse_key;
use crate::session::Session;

/// Minimum study time for a day to count towards the streak (25 min).
pub const MIN_DAILY_TIME: u64 = 25 * 60;

/// Summed duration per date key.
pub fn daily_totals(sessions: &[Session]) -> HashMap<&str, u64> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for session in sessions.iter().filter(|s| s.duration > 0) {
        *totals.entry(session.date.as_str()).or_default() += session.duration;
    }
    totals
}

/// Days whose total meets [`MIN_DAILY_TIME`]. Unparsable date keys are ignored.
pub fn qualifying_days(sessions: &[Session]) -> HashSet<NaiveDate> {
    daily_totals(sessions)
        .into_iter()
        .filter(|(_, total)| *total >= MIN_DAILY_TIME)
        .filter_map(|(key, _)| parse_key(key))
        .collect()
}

/// Current streak as of `today`.
pub fn current_streak(sessions: &[Session], today: NaiveDate) -> u32 {
    streak_from(&qualifying_days(sessions), today)
}

pub fn streak_from(qualifying: &HashSet<NaiveDate>, today: NaiveDate) -> u32 {
    let mut cursor = if qualifying.contains(&today) {
        today
    } else {
        match today.pred_opt() {
            Some(yesterday) if qualifying.contains(&yesterday) => yesterday,
            _ => return 0,
        }
    };

    let mut streak = 0;
    while qualifying.contains(&cursor) {
        streak += 1;
        match cursor.pred_opt() {
            Some(previous) => cursor = previous,
            None => break,
        }
    }
    streak
}
