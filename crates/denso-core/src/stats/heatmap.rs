//! Daily activity grid over the last few Monday-aligned weeks.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use super::dates::{format_key, week_start};
use super::streak::daily_totals;
use crate::session::Session;

/// Weeks shown by default.
pub const HEATMAP_WEEKS: usize = 16;

/// Intensity bucket (0 to 4) for a day's study minutes.
pub fn intensity(minutes: u64) -> u8 {
    match minutes {
        0 => 0,
        1..=24 => 1,
        25..=59 => 2,
        60..=119 => 3,
        _ => 4,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeatmapDay {
    pub date: NaiveDate,
    pub minutes: u64,
    pub intensity: u8,
    /// After `today`; never counted as activity.
    pub future: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityHeatmap {
    /// Column-major: seven days per week, Monday first, oldest week first.
    pub days: Vec<HeatmapDay>,
    /// Days up to today with any study time.
    pub active_days: u32,
    pub total_minutes: u64,
}

impl ActivityHeatmap {
    pub fn weeks(&self) -> impl Iterator<Item = &[HeatmapDay]> {
        self.days.chunks(7)
    }
}

/// Build the grid ending with the week that contains `today`.
///
/// Minutes are the day's summed seconds, rounded to the nearest minute.
pub fn activity_heatmap(sessions: &[Session], today: NaiveDate, weeks: usize) -> ActivityHeatmap {
    let totals = daily_totals(sessions);
    let back = weeks.saturating_sub(1) as u64 * 7;
    let first = week_start(today.checked_sub_days(Days::new(back)).unwrap_or(today));

    let mut days = Vec::with_capacity(weeks * 7);
    let mut active_days = 0;
    let mut total_minutes = 0;
    for date in first.iter_days().take(weeks * 7) {
        let seconds = totals.get(format_key(date).as_str()).copied().unwrap_or(0);
        let minutes = (seconds + 30) / 60;
        let future = date > today;
        if !future && minutes > 0 {
            active_days += 1;
            total_minutes += minutes;
        }
        days.push(HeatmapDay {
            date,
            minutes,
            intensity: intensity(minutes),
            future,
        });
    }

    ActivityHeatmap {
        days,
        active_days,
        total_minutes,
    }
}
