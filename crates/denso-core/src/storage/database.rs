//! SQLite-based storage.
//!
//! Provides persistent storage for:
//! - The session log (`sessions` table)
//! - Key-value store for application state (subjects, goal, timer, ...)

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, KeyValueStore};
use crate::error::{DatabaseError, Result};
use crate::session::Session;

/// Current schema version.
const SCHEMA_VERSION: i32 = 1;

/// SQLite database for sessions and key-value state.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/denso/denso.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("denso.db"))
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );",
        )?;
        let version: i32 = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get::<_, Option<i32>>(0)
            })?
            .unwrap_or(0);

        if version < 1 {
            self.conn
                .execute_batch(
                    "CREATE TABLE IF NOT EXISTS sessions (
                        id         TEXT PRIMARY KEY,
                        timestamp  INTEGER NOT NULL,
                        date       TEXT NOT NULL,
                        duration   INTEGER NOT NULL,
                        subject_id TEXT
                    );

                    CREATE TABLE IF NOT EXISTS kv (
                        key   TEXT PRIMARY KEY,
                        value TEXT NOT NULL
                    );

                    CREATE INDEX IF NOT EXISTS idx_sessions_date ON sessions(date);",
                )
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                [SCHEMA_VERSION],
            )?;
            tracing::debug!(version = SCHEMA_VERSION, "database schema created");
        }
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Append a session to the log table.
    ///
    /// # Errors
    /// Returns an error if the insert fails (for example, a duplicate id).
    pub fn record_session(&self, session: &Session) -> Result<()> {
        let duration = i64::try_from(session.duration).map_err(|_| {
            DatabaseError::QueryFailed(format!("duration out of range: {}", session.duration))
        })?;
        self.conn.execute(
            "INSERT INTO sessions (id, timestamp, date, duration, subject_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                session.id,
                session.timestamp,
                session.date,
                duration,
                session.subject_id,
            ],
        )?;
        Ok(())
    }

    /// All stored sessions in insertion order.
    ///
    /// Rows whose duration is not a positive integer, or whose other columns
    /// have the wrong type, are skipped with a warning.
    pub fn load_sessions(&self) -> Result<Vec<Session>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, timestamp, date, duration, subject_id FROM sessions ORDER BY rowid",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, Value>(0)?,
                row.get::<_, Value>(1)?,
                row.get::<_, Value>(2)?,
                row.get::<_, Value>(3)?,
                row.get::<_, Value>(4)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, timestamp, date, duration, subject_id) = row?;
            match session_from_values(id, timestamp, date, duration, subject_id) {
                Some(session) => sessions.push(session),
                None => tracing::warn!("skipping malformed session row"),
            }
        }
        Ok(sessions)
    }

    pub fn session_count(&self) -> Result<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, rusqlite::Error> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

impl KeyValueStore for Database {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        Ok(self.kv_get(key)?)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        Ok(self.kv_set(key, value)?)
    }
}

fn session_from_values(
    id: Value,
    timestamp: Value,
    date: Value,
    duration: Value,
    subject_id: Value,
) -> Option<Session> {
    let id = match id {
        Value::Text(id) => id,
        Value::Integer(id) => id.to_string(),
        _ => return None,
    };
    let Value::Integer(timestamp) = timestamp else {
        return None;
    };
    let Value::Text(date) = date else {
        return None;
    };
    let duration = match duration {
        Value::Integer(d) if d > 0 => d as u64,
        _ => return None,
    };
    let subject_id = match subject_id {
        Value::Text(s) if !s.is_empty() => Some(s),
        Value::Integer(n) => Some(n.to_string()),
        _ => None,
    };
    Some(Session {
        id,
        timestamp,
        date,
        duration,
        subject_id,
    })
}
