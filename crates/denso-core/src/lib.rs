//! # Denso Core Library
//!
//! Core logic for the Denso study timer: a Pomodoro / stopwatch engine, an
//! append-only log of study sessions and the statistics derived from it.
//! The `denso` CLI is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-anchored state machine. The caller passes
//!   the current time to every operation and calls `tick()` to refresh the
//!   display; [`TimerController`] drives ticks from a tokio task.
//! - **Sessions and Stats**: [`SessionLog`] records completed work;
//!   [`compute_stats`] derives today/week totals, streak and per-subject time;
//!   [`activity_heatmap`] buckets recent days by study minutes.
//! - **Study data**: subjects with to-dos, achievements and a calendar.
//! - **Storage**: SQLite session/kv storage and TOML configuration.
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`SessionRecorder`]: Timer listener that appends to the session log
//! - [`Database`]: Session and key-value persistence
//! - [`Config`]: Application configuration management

pub mod achievements;
pub mod calendar;
pub mod error;
pub mod events;
pub mod format;
pub mod session;
pub mod stats;
pub mod storage;
pub mod subjects;
pub mod timer;

pub use achievements::{Achievement, AchievementTracker, ACHIEVEMENTS};
pub use calendar::{CalendarEvent, CalendarStore, EventKind, EventUpdate, NewEvent};
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use events::Event;
pub use format::{format_duration, format_time};
pub use session::{Session, SessionLog, SessionRecorder};
pub use stats::{activity_heatmap, compute_stats, ActivityHeatmap, StatsCache, StatsSnapshot};
pub use storage::{Config, Database, KeyValueStore, MemoryStore};
pub use subjects::{Subject, SubjectStore, SubjectUpdate, Todo};
pub use timer::{
    Clock, ManualClock, Phase, SystemClock, TimerConfig, TimerController, TimerEngine,
    TimerListener, TimerMode, TimerSnapshot,
};
