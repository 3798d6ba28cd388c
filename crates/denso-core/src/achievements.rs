//! Achievement catalog and unlock tracking.

use std::collections::HashSet;

use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::session::Session;
use crate::stats::StatsSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    /// At least this many sessions.
    Sessions(usize),
    /// Current streak of at least this many days.
    Streak(u32),
    /// At least this many hours in total.
    Hours(u64),
    /// A session completed before 07:00 local time.
    EarlyBird,
    /// A session completed at or after 23:00 local time.
    NightOwl,
    /// Sessions on both a Saturday and a Sunday.
    WeekendWarrior,
    /// A single session of at least this many seconds.
    LongSession(u64),
    /// Sessions across at least this many distinct subjects.
    Diverse(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub icon: &'static str,
    pub title: &'static str,
    pub condition: Condition,
}

#[rustfmt::skip]
pub const ACHIEVEMENTS: &[Achievement] = &[
    Achievement { id: "first_session", icon: "rocket", title: "First session", condition: Condition::Sessions(1) },
    Achievement { id: "sessions_10", icon: "zap", title: "10 sessions", condition: Condition::Sessions(10) },
    Achievement { id: "sessions_50", icon: "star", title: "50 sessions", condition: Condition::Sessions(50) },
    Achievement { id: "sessions_100", icon: "trophy", title: "100 sessions", condition: Condition::Sessions(100) },
    Achievement { id: "sessions_500", icon: "crown", title: "500 sessions", condition: Condition::Sessions(500) },
    Achievement { id: "streak_3", icon: "flame", title: "3-day streak", condition: Condition::Streak(3) },
    Achievement { id: "streak_7", icon: "flame", title: "7-day streak", condition: Condition::Streak(7) },
    Achievement { id: "streak_30", icon: "flame", title: "30-day streak", condition: Condition::Streak(30) },
    Achievement { id: "streak_100", icon: "flame", title: "100-day streak", condition: Condition::Streak(100) },
    Achievement { id: "hours_10", icon: "clock", title: "10 hours", condition: Condition::Hours(10) },
    Achievement { id: "hours_50", icon: "clock", title: "50 hours", condition: Condition::Hours(50) },
    Achievement { id: "hours_100", icon: "clock", title: "100 hours", condition: Condition::Hours(100) },
    Achievement { id: "hours_500", icon: "clock", title: "500 hours", condition: Condition::Hours(500) },
    Achievement { id: "hours_1000", icon: "clock", title: "1000 hours", condition: Condition::Hours(1000) },
    Achievement { id: "early_bird", icon: "sun", title: "Early bird", condition: Condition::EarlyBird },
    Achievement { id: "night_owl", icon: "moon", title: "Night owl", condition: Condition::NightOwl },
    Achievement { id: "weekend_warrior", icon: "calendar", title: "Weekend warrior", condition: Condition::WeekendWarrior },
    Achievement { id: "long_session", icon: "target", title: "Two-hour session", condition: Condition::LongSession(7200) },
    Achievement { id: "diverse", icon: "book", title: "Five subjects", condition: Condition::Diverse(5) },
];

impl Condition {
    /// Evaluate against the log; clock-based conditions use `tz`.
    pub fn is_met<Tz: TimeZone>(
        &self,
        sessions: &[Session],
        stats: &StatsSnapshot,
        tz: &Tz,
    ) -> bool {
        let local = |s: &Session| {
            DateTime::<Utc>::from_timestamp_millis(s.timestamp).map(|t| t.with_timezone(tz))
        };
        match *self {
            Condition::Sessions(n) => sessions.len() >= n,
            Condition::Streak(days) => stats.streak >= days,
            Condition::Hours(hours) => {
                let total: u64 = sessions.iter().map(|s| s.duration).sum();
                total >= hours.saturating_mul(3600)
            }
            Condition::EarlyBird => sessions.iter().filter_map(local).any(|t| t.hour() < 7),
            Condition::NightOwl => sessions.iter().filter_map(local).any(|t| t.hour() >= 23),
            Condition::WeekendWarrior => {
                let days: HashSet<Weekday> = sessions
                    .iter()
                    .filter_map(local)
                    .map(|t| t.weekday())
                    .collect();
                days.contains(&Weekday::Sat) && days.contains(&Weekday::Sun)
            }
            Condition::LongSession(secs) => sessions.iter().any(|s| s.duration >= secs),
            Condition::Diverse(n) => {
                let subjects: HashSet<&str> = sessions
                    .iter()
                    .filter_map(|s| s.subject_id.as_deref())
                    .filter(|id| !id.is_empty())
                    .collect();
                subjects.len() >= n
            }
        }
    }
}

/// Ids of every achievement whose condition currently holds.
pub fn unlocked<Tz: TimeZone>(
    sessions: &[Session],
    stats: &StatsSnapshot,
    tz: &Tz,
) -> Vec<&'static str> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| a.condition.is_met(sessions, stats, tz))
        .map(|a| a.id)
        .collect()
}

/// Achievements that hold now but are not in `previously`.
pub fn newly_unlocked<Tz: TimeZone>(
    sessions: &[Session],
    stats: &StatsSnapshot,
    previously: &[String],
    tz: &Tz,
) -> Vec<&'static Achievement> {
    ACHIEVEMENTS
        .iter()
        .filter(|a| !previously.iter().any(|id| id == a.id))
        .filter(|a| a.condition.is_met(sessions, stats, tz))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementStatus {
    pub id: String,
    pub icon: String,
    pub title: String,
    pub unlocked: bool,
}

impl AchievementStatus {
    fn of(achievement: &Achievement, unlocked: bool) -> Self {
        Self {
            id: achievement.id.to_string(),
            icon: achievement.icon.to_string(),
            title: achievement.title.to_string(),
            unlocked,
        }
    }
}

/// The whole catalog, flagged by whether each condition holds right now.
pub fn progress<Tz: TimeZone>(
    sessions: &[Session],
    stats: &StatsSnapshot,
    tz: &Tz,
) -> Vec<AchievementStatus> {
    ACHIEVEMENTS
        .iter()
        .map(|a| AchievementStatus::of(a, a.condition.is_met(sessions, stats, tz)))
        .collect()
}

/// Remembers unlocked achievement ids across recomputations.
///
/// Once unlocked an achievement stays unlocked, even if its condition later
/// stops holding (a streak that broke, for example).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AchievementTracker {
    unlocked: Vec<String>,
}

impl AchievementTracker {
    pub fn new(unlocked: Vec<String>) -> Self {
        Self { unlocked }
    }

    /// Record and return achievements unlocked since the last check.
    pub fn check<Tz: TimeZone>(
        &mut self,
        sessions: &[Session],
        stats: &StatsSnapshot,
        tz: &Tz,
    ) -> Vec<&'static Achievement> {
        let fresh = newly_unlocked(sessions, stats, &self.unlocked, tz);
        for achievement in &fresh {
            tracing::info!(id = achievement.id, "achievement unlocked");
            self.unlocked.push(achievement.id.to_string());
        }
        fresh
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.unlocked.iter().any(|u| u == id)
    }

    pub fn unlocked_count(&self) -> usize {
        self.unlocked.len()
    }

    pub fn total_count(&self) -> usize {
        ACHIEVEMENTS.len()
    }

    /// The whole catalog with unlock flags.
    pub fn statuses(&self) -> Vec<AchievementStatus> {
        ACHIEVEMENTS
            .iter()
            .map(|a| AchievementStatus::of(a, self.is_unlocked(a.id)))
            .collect()
    }

    pub fn ids(&self) -> &[String] {
        &self.unlocked
    }
}
