use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone};

use super::{compute_stats, StatsSnapshot};
use crate::session::SessionLog;

/// Memoizes [`compute_stats`] on (log version, weekly goal, local day).
#[derive(Debug, Default)]
pub struct StatsCache {
    key: Option<(u64, u64, NaiveDate)>,
    snapshot: Option<Arc<StatsSnapshot>>,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get<Tz: TimeZone>(
        &mut self,
        log: &SessionLog,
        weekly_goal_secs: u64,
        now: &DateTime<Tz>,
    ) -> Arc<StatsSnapshot> {
        // Version and snapshot must come from the same instant.
        let (version, sessions) = log.versioned_snapshot();
        let key = (version, weekly_goal_secs, now.date_naive());
        if let (Some(cached_key), Some(snapshot)) = (self.key, &self.snapshot) {
            if cached_key == key {
                return Arc::clone(snapshot);
            }
        }
        let snapshot = Arc::new(compute_stats(&sessions, weekly_goal_secs, now));
        self.key = Some(key);
        self.snapshot = Some(Arc::clone(&snapshot));
        snapshot
    }
}
