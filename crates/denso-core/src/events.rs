use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerMode};

/// Every timer state change produces an Event.
///
/// Timestamps are milliseconds since the Unix epoch, taken from the `now_ms`
/// the caller passed to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        phase: Phase,
        display_secs: u64,
        at_ms: i64,
    },
    TimerPaused {
        mode: TimerMode,
        display_secs: u64,
        at_ms: i64,
    },
    TimerReset {
        mode: TimerMode,
    },
    /// Work phase restarted with a new length, keeping the running state.
    TimerRestarted {
        duration_secs: u64,
        running: bool,
    },
    ModeSwitched {
        mode: TimerMode,
    },
    BreakSkipped,
    /// A unit of study time should be appended to the session log.
    ///
    /// `completed_at_ms` is when the work actually ended, which can be
    /// earlier than the tick that noticed it.
    SessionCompleted {
        duration_secs: u64,
        completed_at_ms: i64,
    },
    /// A countdown phase ran out and the next one has begun.
    PhaseCompleted {
        phase: Phase,
        next_duration_secs: u64,
        long_break: bool,
        at_ms: i64,
    },
}

impl Event {
    /// Short snake_case name, used for log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Event::TimerStarted { .. } => "timer_started",
            Event::TimerPaused { .. } => "timer_paused",
            Event::TimerReset { .. } => "timer_reset",
            Event::TimerRestarted { .. } => "timer_restarted",
            Event::ModeSwitched { .. } => "mode_switched",
            Event::BreakSkipped => "break_skipped",
            Event::SessionCompleted { .. } => "session_completed",
            Event::PhaseCompleted { .. } => "phase_completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let json = serde_json::to_value(Event::SessionCompleted {
            duration_secs: 1500,
            completed_at_ms: 42,
        })
        .unwrap();
        assert_eq!(json["type"], "session_completed");
        assert_eq!(json["duration_secs"], 1500);
        assert_eq!(json["completed_at_ms"], 42);
    }

    #[test]
    fn phase_is_lowercase_on_the_wire() {
        let event = Event::PhaseCompleted {
            phase: Phase::Work,
            next_duration_secs: 300,
            long_break: false,
            at_ms: 0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["phase"], "work");
        assert_eq!(event.name(), json["type"]);
    }
}
