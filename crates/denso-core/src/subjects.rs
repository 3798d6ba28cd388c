//! Subjects (what is being studied) and their to-do lists.
//!
//! Each subject carries its own Pomodoro lengths. The store always holds at
//! least one subject and tracks which one is current.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::timer::TimerConfig;

/// Id of the subject created on first run.
pub const DEFAULT_SUBJECT_ID: &str = "1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub emoji: Option<String>,
    /// Seconds. Zero or missing values are replaced on load.
    #[serde(default)]
    pub work_duration: u64,
    #[serde(default)]
    pub break_duration: u64,
    #[serde(default)]
    pub long_break_duration: u64,
    #[serde(default = "default_long_break_interval")]
    pub long_break_interval: u32,
    #[serde(default)]
    pub todos: Vec<Todo>,
}

fn default_long_break_interval() -> u32 {
    TimerConfig::default().long_break_interval
}

impl Subject {
    pub fn new(id: impl Into<String>, name: impl Into<String>, template: &TimerConfig) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            emoji: None,
            work_duration: template.work_duration,
            break_duration: template.break_duration,
            long_break_duration: template.long_break_duration,
            long_break_interval: template.long_break_interval,
            todos: Vec::new(),
        }
    }

    pub fn timer_config(&self) -> TimerConfig {
        TimerConfig {
            work_duration: self.work_duration,
            break_duration: self.break_duration,
            long_break_duration: self.long_break_duration,
            long_break_interval: self.long_break_interval,
        }
    }

    /// Fill durations that older data left empty.
    fn normalize(&mut self) {
        let defaults = TimerConfig::default();
        if self.work_duration == 0 {
            self.work_duration = defaults.work_duration;
        }
        if self.break_duration == 0 {
            self.break_duration = defaults.break_duration;
        }
        if self.long_break_duration == 0 {
            self.long_break_duration = defaults.long_break_duration;
        }
    }
}

impl Default for Subject {
    fn default() -> Self {
        let mut subject = Self::new(DEFAULT_SUBJECT_ID, "General", &TimerConfig::default());
        subject.emoji = Some("💻".into());
        subject
    }
}

/// Partial update for [`SubjectStore::update`]. `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct SubjectUpdate {
    pub name: Option<String>,
    /// `Some(None)` clears the emoji.
    pub emoji: Option<Option<String>>,
    pub work_duration: Option<u64>,
    pub break_duration: Option<u64>,
    pub long_break_duration: Option<u64>,
    pub long_break_interval: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectStore {
    subjects: Vec<Subject>,
    current: String,
}

impl Default for SubjectStore {
    fn default() -> Self {
        Self {
            subjects: vec![Subject::default()],
            current: DEFAULT_SUBJECT_ID.to_string(),
        }
    }
}

impl SubjectStore {
    /// Rebuild from persisted parts. An empty list falls back to the default
    /// subject and an unknown current id falls back to the first subject.
    pub fn from_parts(mut subjects: Vec<Subject>, current: Option<String>) -> Self {
        if subjects.is_empty() {
            return Self::default();
        }
        subjects.iter_mut().for_each(Subject::normalize);
        let current = current
            .filter(|id| subjects.iter().any(|s| &s.id == id))
            .unwrap_or_else(|| subjects[0].id.clone());
        Self { subjects, current }
    }

    pub fn list(&self) -> &[Subject] {
        &self.subjects
    }

    pub fn get(&self, id: &str) -> Option<&Subject> {
        self.subjects.iter().find(|s| s.id == id)
    }

    pub fn current_id(&self) -> &str {
        &self.current
    }

    pub fn current(&self) -> &Subject {
        self.get(&self.current).unwrap_or(&self.subjects[0])
    }

    /// # Errors
    /// [`ValidationError::NotFound`] if no subject has this id.
    pub fn set_current(&mut self, id: &str) -> Result<(), ValidationError> {
        self.find(id)?;
        self.current = id.to_string();
        Ok(())
    }

    /// Add a subject with durations copied from `template`. Returns its id.
    ///
    /// # Errors
    /// [`ValidationError::InvalidValue`] for a blank name.
    pub fn add(
        &mut self,
        name: &str,
        template: &TimerConfig,
        now_ms: i64,
    ) -> Result<String, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::invalid("name", "must not be empty"));
        }
        let id = unique_id(now_ms, |candidate| self.get(candidate).is_some());
        self.subjects.push(Subject::new(id.clone(), name, template));
        Ok(id)
    }

    /// # Errors
    /// [`ValidationError::NotFound`] for an unknown id, or
    /// [`ValidationError::InvalidValue`] for a blank name or zero duration.
    pub fn update(&mut self, id: &str, update: SubjectUpdate) -> Result<&Subject, ValidationError> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(ValidationError::invalid("name", "must not be empty"));
            }
        }
        let durations = [
            ("work_duration", update.work_duration),
            ("break_duration", update.break_duration),
            ("long_break_duration", update.long_break_duration),
        ];
        for (field, value) in durations {
            if value == Some(0) {
                return Err(ValidationError::invalid(field, "must be greater than zero"));
            }
        }

        let subject = self.find_mut(id)?;
        if let Some(name) = update.name {
            subject.name = name.trim().to_string();
        }
        if let Some(emoji) = update.emoji {
            subject.emoji = emoji;
        }
        if let Some(v) = update.work_duration {
            subject.work_duration = v;
        }
        if let Some(v) = update.break_duration {
            subject.break_duration = v;
        }
        if let Some(v) = update.long_break_duration {
            subject.long_break_duration = v;
        }
        if let Some(v) = update.long_break_interval {
            subject.long_break_interval = v;
        }
        Ok(subject)
    }

    /// Remove a subject. The last one can never be removed; if the current
    /// subject goes, the first remaining one becomes current.
    ///
    /// # Errors
    /// [`ValidationError::LastSubject`] or [`ValidationError::NotFound`].
    pub fn delete(&mut self, id: &str) -> Result<Subject, ValidationError> {
        let index = self
            .subjects
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ValidationError::not_found("Subject", id))?;
        if self.subjects.len() <= 1 {
            return Err(ValidationError::LastSubject);
        }
        let removed = self.subjects.remove(index);
        if self.current == removed.id {
            self.current = self.subjects[0].id.clone();
        }
        Ok(removed)
    }

    // ── Todos ────────────────────────────────────────────────────────

    pub fn add_todo(
        &mut self,
        subject_id: &str,
        text: &str,
        now_ms: i64,
    ) -> Result<String, ValidationError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ValidationError::invalid("text", "must not be empty"));
        }
        let subject = self.find_mut(subject_id)?;
        let id = unique_id(now_ms, |candidate| {
            subject.todos.iter().any(|t| t.id == candidate)
        });
        subject.todos.push(Todo {
            id: id.clone(),
            text: text.to_string(),
            completed: false,
            created_at: now_ms,
        });
        Ok(id)
    }

    /// Flip a todo's completed flag and return the new value.
    pub fn toggle_todo(
        &mut self,
        subject_id: &str,
        todo_id: &str,
    ) -> Result<bool, ValidationError> {
        let todo = self
            .find_mut(subject_id)?
            .todos
            .iter_mut()
            .find(|t| t.id == todo_id)
            .ok_or_else(|| ValidationError::not_found("Todo", todo_id))?;
        todo.completed = !todo.completed;
        Ok(todo.completed)
    }

    pub fn delete_todo(
        &mut self,
        subject_id: &str,
        todo_id: &str,
    ) -> Result<Todo, ValidationError> {
        let todos = &mut self.find_mut(subject_id)?.todos;
        let index = todos
            .iter()
            .position(|t| t.id == todo_id)
            .ok_or_else(|| ValidationError::not_found("Todo", todo_id))?;
        Ok(todos.remove(index))
    }

    fn find(&self, id: &str) -> Result<&Subject, ValidationError> {
        self.get(id)
            .ok_or_else(|| ValidationError::not_found("Subject", id))
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut Subject, ValidationError> {
        self.subjects
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ValidationError::not_found("Subject", id))
    }
}

/// Timestamp-derived id, suffixed `-N` while `taken` says it is in use.
fn unique_id(now_ms: i64, taken: impl Fn(&str) -> bool) -> String {
    let base = now_ms.to_string();
    if !taken(&base) {
        return base;
    }
    let mut n = 1u32;
    loop {
        let candidate = format!("{base}-{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
