//! Calendar of study blocks, exams and personal events.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::stats::{format_key, parse_key};

/// Maximum number of entries returned by [`CalendarStore::upcoming`].
pub const UPCOMING_LIMIT: usize = 5;

const TIME_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    #[default]
    StudyBlock,
    Exam,
    Personal,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::StudyBlock => "study-block",
            EventKind::Exam => "exam",
            EventKind::Personal => "personal",
        }
    }
}

impl std::str::FromStr for EventKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study-block" | "study" => Ok(EventKind::StudyBlock),
            "exam" => Ok(EventKind::Exam),
            "personal" => Ok(EventKind::Personal),
            other => Err(ValidationError::invalid(
                "kind",
                format!("unknown event kind '{other}'"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    pub title: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: i64,
}

/// Input for [`CalendarStore::add`].
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub kind: EventKind,
    pub title: String,
    pub date: String,
    pub time: Option<String>,
    pub duration: Option<u32>,
    pub subject_id: Option<String>,
}

/// Partial update; `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct EventUpdate {
    pub kind: Option<EventKind>,
    pub title: Option<String>,
    pub date: Option<String>,
    pub time: Option<Option<String>>,
    pub duration: Option<Option<u32>>,
    pub subject_id: Option<Option<String>>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarStore {
    events: Vec<CalendarEvent>,
}

impl CalendarStore {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        Self { events }
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.events
    }

    pub fn get(&self, id: &str) -> Option<&CalendarEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Validate and store a new event. Returns its id.
    pub fn add(&mut self, new: NewEvent, now_ms: i64) -> Result<String, ValidationError> {
        let title = validate_title(&new.title)?;
        validate_date(&new.date)?;
        if let Some(time) = &new.time {
            validate_time(time)?;
        }
        validate_duration(new.duration)?;

        let id = Uuid::new_v4().to_string();
        self.events.push(CalendarEvent {
            id: id.clone(),
            kind: new.kind,
            title,
            date: new.date,
            time: new.time,
            duration: new.duration,
            subject_id: new.subject_id.filter(|s| !s.is_empty()),
            completed: false,
            created_at: now_ms,
        });
        tracing::debug!(%id, kind = new.kind.as_str(), "calendar event added");
        Ok(id)
    }

    pub fn update(
        &mut self,
        id: &str,
        update: EventUpdate,
    ) -> Result<&CalendarEvent, ValidationError> {
        let title = update.title.as_deref().map(validate_title).transpose()?;
        if let Some(date) = &update.date {
            validate_date(date)?;
        }
        if let Some(Some(time)) = &update.time {
            validate_time(time)?;
        }
        if let Some(duration) = update.duration {
            validate_duration(duration)?;
        }

        let event = self.find_mut(id)?;
        if let Some(kind) = update.kind {
            event.kind = kind;
        }
        if let Some(title) = title {
            event.title = title;
        }
        if let Some(date) = update.date {
            event.date = date;
        }
        if let Some(time) = update.time {
            event.time = time;
        }
        if let Some(duration) = update.duration {
            event.duration = duration;
        }
        if let Some(subject_id) = update.subject_id {
            event.subject_id = subject_id;
        }
        if let Some(completed) = update.completed {
            event.completed = completed;
        }
        Ok(event)
    }

    pub fn delete(&mut self, id: &str) -> Result<CalendarEvent, ValidationError> {
        let index = self
            .events
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(|| ValidationError::not_found("Event", id))?;
        Ok(self.events.remove(index))
    }

    /// Flip the completed flag and return the new value.
    pub fn toggle_complete(&mut self, id: &str) -> Result<bool, ValidationError> {
        let event = self.find_mut(id)?;
        event.completed = !event.completed;
        Ok(event.completed)
    }

    /// Mark the first open study block for `subject_id` on `date` as done.
    /// Returns the id of the block that was completed, if any.
    pub fn complete_study_block(&mut self, subject_id: &str, date: &str) -> Option<String> {
        let event = self.events.iter_mut().find(|e| {
            e.kind == EventKind::StudyBlock
                && e.date == date
                && e.subject_id.as_deref() == Some(subject_id)
                && !e.completed
        })?;
        event.completed = true;
        tracing::debug!(id = %event.id, subject_id, date, "study block completed");
        Some(event.id.clone())
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn for_date(&self, date: NaiveDate) -> Vec<&CalendarEvent> {
        let key = format_key(date);
        self.events.iter().filter(|e| e.date == key).collect()
    }

    /// Events in a calendar month; `month` is 1-based.
    pub fn for_month(&self, year: i32, month: u32) -> Vec<&CalendarEvent> {
        let prefix = format!("{year:04}-{month:02}-");
        self.events
            .iter()
            .filter(|e| e.date.starts_with(&prefix))
            .collect()
    }

    /// Open events from `today` on, soonest first, at most [`UPCOMING_LIMIT`].
    pub fn upcoming(&self, today: NaiveDate) -> Vec<&CalendarEvent> {
        let mut events = self.on_or_after(today, |e| !e.completed);
        events.truncate(UPCOMING_LIMIT);
        events
    }

    /// Exams from `today` on, soonest first, completed or not.
    pub fn upcoming_exams(&self, today: NaiveDate) -> Vec<&CalendarEvent> {
        self.on_or_after(today, |e| e.kind == EventKind::Exam)
    }

    // ── Internal ────────────────────────────────────────────────────

    fn on_or_after(
        &self,
        today: NaiveDate,
        keep: impl Fn(&CalendarEvent) -> bool,
    ) -> Vec<&CalendarEvent> {
        let today = format_key(today);
        let mut events: Vec<&CalendarEvent> = self
            .events
            .iter()
            .filter(|e| e.date.as_str() >= today.as_str() && keep(e))
            .collect();
        events.sort_by(|a, b| a.date.cmp(&b.date));
        events
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut CalendarEvent, ValidationError> {
        self.events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ValidationError::not_found("Event", id))
    }
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::invalid("title", "must not be empty"));
    }
    Ok(title.to_string())
}

fn validate_date(date: &str) -> Result<(), ValidationError> {
    parse_key(date).map(|_| ()).ok_or_else(|| {
        ValidationError::invalid("date", format!("expected YYYY-MM-DD, got '{date}'"))
    })
}

fn validate_time(time: &str) -> Result<(), ValidationError> {
    NaiveTime::parse_from_str(time, TIME_FORMAT)
        .map(|_| ())
        .map_err(|_| ValidationError::invalid("time", format!("expected HH:MM, got '{time}'")))
}

fn validate_duration(duration: Option<u32>) -> Result<(), ValidationError> {
    if duration == Some(0) {
        return Err(ValidationError::invalid("duration", "must be greater than zero"));
    }
    Ok(())
}
