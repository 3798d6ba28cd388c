pub mod achievements;
pub mod calendar;
pub mod config;
pub mod goal;
pub mod stats;
pub mod subject;
pub mod timer;
pub mod todo;

use chrono::Local;
use denso_core::achievements::Achievement;
use denso_core::storage::keys;
use denso_core::{
    compute_stats, AchievementTracker, CalendarStore, Config, Database, KeyValueStore, Session,
    SessionLog, StatsSnapshot, SubjectStore, TimerEngine,
};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Opened database plus configuration, shared by every command.
pub struct Store {
    pub db: Database,
    pub config: Config,
}

impl Store {
    pub fn open() -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load_or_default();
        let db = Database::open()?;
        Ok(Self { db, config })
    }

    // ── Subjects ─────────────────────────────────────────────────────

    pub fn subjects(&self) -> denso_core::Result<SubjectStore> {
        Ok(SubjectStore::from_parts(
            self.db.load(keys::SUBJECTS, Vec::new())?,
            self.db.load(keys::CURRENT_SUBJECT, None)?,
        ))
    }

    pub fn save_subjects(&self, subjects: &SubjectStore) -> denso_core::Result<()> {
        self.db.save(keys::SUBJECTS, subjects.list())?;
        self.db.save(keys::CURRENT_SUBJECT, subjects.current_id())
    }

    // ── Timer ────────────────────────────────────────────────────────

    /// Persisted engine, with the current subject's durations applied
    /// (deferred by the engine while it runs).
    pub fn engine(&self, subjects: &SubjectStore) -> denso_core::Result<TimerEngine> {
        let config = subjects.current().timer_config();
        let mut engine = self
            .db
            .load(keys::TIMER_ENGINE, TimerEngine::new(config))?;
        if *engine.config() != config && engine.pending_config() != Some(&config) {
            engine.update_durations(config);
        }
        Ok(engine)
    }

    pub fn save_engine(&self, engine: &TimerEngine) -> denso_core::Result<()> {
        self.db.save(keys::TIMER_ENGINE, engine)
    }

    // ── Sessions and stats ───────────────────────────────────────────

    pub fn session_log(&self) -> denso_core::Result<SessionLog> {
        Ok(SessionLog::from_sessions(self.db.load_sessions()?))
    }

    /// Append a session for the current subject, close the matching study
    /// block and report any achievements it unlocked.
    pub fn record_session(
        &self,
        duration_secs: u64,
        completed_at_ms: i64,
        subjects: &SubjectStore,
    ) -> denso_core::Result<Option<Session>> {
        let log = self.session_log()?;
        let subject_id = subjects.current_id().to_string();
        let Some(session) = log.append(duration_secs, Some(subject_id.clone()), completed_at_ms)
        else {
            return Ok(None);
        };
        self.db.record_session(&session)?;
        tracing::info!(id = %session.id, duration = session.duration, "session saved");

        let mut calendar = self.calendar()?;
        if calendar
            .complete_study_block(&subject_id, &session.date)
            .is_some()
        {
            self.db.save(keys::EVENTS, &calendar)?;
        }

        for achievement in self.check_achievements(&log)? {
            eprintln!("achievement unlocked: {} {}", achievement.icon, achievement.title);
        }
        Ok(Some(session))
    }

    pub fn weekly_goal(&self) -> denso_core::Result<u64> {
        self.db
            .load(keys::WEEKLY_GOAL, self.config.weekly_goal_secs())
    }

    pub fn stats(&self, log: &SessionLog) -> denso_core::Result<StatsSnapshot> {
        Ok(compute_stats(&log.snapshot(), self.weekly_goal()?, &Local::now()))
    }

    // ── Achievements and calendar ────────────────────────────────────

    pub fn tracker(&self) -> denso_core::Result<AchievementTracker> {
        self.db.load(keys::ACHIEVEMENTS, AchievementTracker::default())
    }

    pub fn check_achievements(
        &self,
        log: &SessionLog,
    ) -> denso_core::Result<Vec<&'static Achievement>> {
        let mut tracker = self.tracker()?;
        let stats = self.stats(log)?;
        let fresh = tracker.check(&log.snapshot(), &stats, &Local);
        if !fresh.is_empty() {
            self.db.save(keys::ACHIEVEMENTS, &tracker)?;
        }
        Ok(fresh)
    }

    pub fn calendar(&self) -> denso_core::Result<CalendarStore> {
        self.db.load(keys::EVENTS, CalendarStore::default())
    }
}

pub fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
