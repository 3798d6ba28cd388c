use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Phase lengths for the Pomodoro cycle, in seconds.
///
/// Values come from the active subject or from the config file. The engine
/// assumes they are positive; use [`TimerConfig::validate`] at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    pub work_duration: u64,
    pub break_duration: u64,
    pub long_break_duration: u64,
    /// Work phases between long breaks. `0` disables long breaks.
    pub long_break_interval: u32,
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            work_duration: 25 * 60,
            break_duration: 5 * 60,
            long_break_duration: 15 * 60,
            long_break_interval: 4,
        }
    }
}

impl TimerConfig {
    /// Whether the break after the `completed`-th work phase is a long one.
    pub fn is_long_break(&self, completed: u32) -> bool {
        self.long_break_interval > 0
            && completed > 0
            && completed.is_multiple_of(self.long_break_interval)
    }

    /// Duration of the break that follows the `completed`-th work phase.
    pub fn break_after(&self, completed: u32) -> u64 {
        if self.is_long_break(completed) {
            self.long_break_duration
        } else {
            self.break_duration
        }
    }

    /// Reject zero durations.
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidValue`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("work_duration", self.work_duration),
            ("break_duration", self.break_duration),
            ("long_break_duration", self.long_break_duration),
        ];
        for (field, value) in fields {
            if value == 0 {
                return Err(ValidationError::invalid(field, "must be greater than zero"));
            }
        }
        Ok(())
    }
}
