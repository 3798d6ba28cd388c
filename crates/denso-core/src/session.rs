//! Append-only session log.
//!
//! Sessions are immutable once created. The log is shared between the
//! recorder (writer) and statistics (reader): appends swap in a new
//! copy-on-write vector, and readers take an `Arc` snapshot that never
//! changes under them.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{Local, TimeZone};
use serde::{Deserialize, Serialize};

use crate::stats::date_key;
use crate::timer::{Phase, TimerListener};

/// A completed unit of study time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Creation timestamp in decimal, with a `-N` suffix on collision.
    pub id: String,
    /// Completion time, ms since epoch.
    pub timestamp: i64,
    /// Local calendar day of `timestamp`, `YYYY-MM-DD`.
    pub date: String,
    /// Seconds, always > 0.
    pub duration: u64,
    #[serde(default)]
    pub subject_id: Option<String>,
}

impl Session {
    /// Build a session dated in the local time zone.
    pub fn new(duration: u64, subject_id: Option<String>, timestamp_ms: i64) -> Self {
        Self::new_in(duration, subject_id, timestamp_ms, &Local)
    }

    pub fn new_in<Tz: TimeZone>(
        duration: u64,
        subject_id: Option<String>,
        timestamp_ms: i64,
        tz: &Tz,
    ) -> Self {
        Self {
            id: timestamp_ms.to_string(),
            timestamp: timestamp_ms,
            date: date_key(timestamp_ms, tz),
            duration,
            subject_id,
        }
    }
}

#[derive(Debug, Default)]
struct LogState {
    sessions: Arc<Vec<Session>>,
    version: u64,
}

#[derive(Debug, Default)]
pub struct SessionLog {
    state: RwLock<LogState>,
}

impl SessionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap sessions loaded from storage, keeping their order.
    pub fn from_sessions(sessions: Vec<Session>) -> Self {
        Self {
            state: RwLock::new(LogState {
                sessions: Arc::new(sessions),
                version: 0,
            }),
        }
    }

    /// Record `duration_secs` of study time finished at `timestamp_ms`.
    /// Returns `None` (and records nothing) for a zero duration.
    pub fn append(
        &self,
        duration_secs: u64,
        subject_id: Option<String>,
        timestamp_ms: i64,
    ) -> Option<Session> {
        self.append_in(duration_secs, subject_id, timestamp_ms, &Local)
    }

    pub fn append_in<Tz: TimeZone>(
        &self,
        duration_secs: u64,
        subject_id: Option<String>,
        timestamp_ms: i64,
        tz: &Tz,
    ) -> Option<Session> {
        if duration_secs == 0 {
            return None;
        }
        Some(self.push(Session::new_in(duration_secs, subject_id, timestamp_ms, tz)))
    }

    /// Append a prepared session, renaming its id if it is already taken.
    pub fn push(&self, mut session: Session) -> Session {
        let mut state = self.write();
        if state.sessions.iter().any(|s| s.id == session.id) {
            let base = session.id.clone();
            let mut n = 1u32;
            while state
                .sessions
                .iter()
                .any(|s| s.id == format!("{base}-{n}"))
            {
                n += 1;
            }
            session.id = format!("{base}-{n}");
        }
        Arc::make_mut(&mut state.sessions).push(session.clone());
        state.version += 1;
        session
    }

    /// Consistent view of the log at this instant.
    pub fn snapshot(&self) -> Arc<Vec<Session>> {
        Arc::clone(&self.read().sessions)
    }

    /// Bumped on every append; used as a memoization key.
    pub fn version(&self) -> u64 {
        self.read().version
    }

    /// Version and sessions read under the same lock.
    pub fn versioned_snapshot(&self) -> (u64, Arc<Vec<Session>>) {
        let state = self.read();
        (state.version, Arc::clone(&state.sessions))
    }

    pub fn len(&self) -> usize {
        self.read().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, LogState> {
        self.state
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, LogState> {
        self.state
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Timer listener that appends completed work to a [`SessionLog`],
/// tagged with the currently selected subject.
pub struct SessionRecorder {
    log: Arc<SessionLog>,
    subject_id: RwLock<Option<String>>,
}

impl SessionRecorder {
    pub fn new(log: Arc<SessionLog>) -> Self {
        Self {
            log,
            subject_id: RwLock::new(None),
        }
    }

    pub fn set_subject(&self, subject_id: Option<String>) {
        *self
            .subject_id
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = subject_id;
    }

    pub fn subject(&self) -> Option<String> {
        self.subject_id
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn log(&self) -> &Arc<SessionLog> {
        &self.log
    }
}

impl TimerListener for SessionRecorder {
    fn on_session_complete(&self, duration_secs: u64, completed_at_ms: i64) {
        if let Some(session) = self
            .log
            .append(duration_secs, self.subject(), completed_at_ms)
        {
            tracing::info!(
                id = %session.id,
                duration = session.duration,
                subject = ?session.subject_id,
                "session recorded"
            );
        }
    }

    fn on_phase_complete(&self, phase: Phase) {
        tracing::debug!(?phase, "phase complete");
    }
}
