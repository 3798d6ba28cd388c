//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads and never reads the clock itself: every time-dependent
//! command takes `now_ms`, and the caller is responsible for calling `tick()`
//! periodically (see [`TimerController`](super::TimerController)).
//!
//! Display time is always recomputed from an absolute anchor, never from a
//! decremented counter, so late or missed ticks self-correct on the next one.
//!
//! ## State Transitions
//!
//! ```text
//! pomodoro.work.stopped <-> pomodoro.work.running
//!        ^                        | (remaining == 0)
//!        | skip_break / tick      v
//! pomodoro.break.stopped <-> pomodoro.break.running
//!
//! free.stopped <-> free.running
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(TimerConfig::default());
//! engine.start(now_ms());
//! // In a loop:
//! for event in engine.tick(now_ms()) { /* record session, notify */ }
//! ```

use serde::{Deserialize, Serialize};

use super::config::TimerConfig;
use crate::events::Event;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    /// Work/break countdown cycle.
    #[default]
    Pomodoro,
    /// Free-running stopwatch, saved manually.
    Free,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Work,
    Break,
}

/// Absolute wall-clock reference the display is recomputed from.
///
/// Present only while the timer runs; the variant always matches the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Anchor {
    /// Pomodoro: when the current phase ends.
    Countdown { target_end_ms: i64 },
    /// Free mode: when the stopwatch would have started had it never paused.
    Stopwatch { start_ms: i64 },
}

/// Serializable view of the engine for UIs and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub mode: TimerMode,
    pub phase: Phase,
    pub is_running: bool,
    pub display_secs: u64,
    pub elapsed_secs: u64,
    pub phase_duration_secs: u64,
    pub progress: Option<f64>,
    pub pomodoro_count: u32,
    pub long_break: bool,
}

/// Core timer engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    config: TimerConfig,
    /// Durations received while running, applied on the next stop-and-reset.
    #[serde(default)]
    pending_config: Option<TimerConfig>,
    mode: TimerMode,
    phase: Phase,
    #[serde(default)]
    anchor: Option<Anchor>,
    /// Remaining seconds captured on pause (Pomodoro).
    paused_time_left: u64,
    /// Elapsed seconds captured on pause (Free).
    paused_elapsed: u64,
    display_time: u64,
    /// Length of the current phase; the progress denominator.
    phase_duration: u64,
    pomodoro_count: u32,
    #[serde(default)]
    long_break: bool,
}

impl TimerEngine {
    /// Create an engine in `pomodoro.work.stopped` showing the full work duration.
    pub fn new(config: TimerConfig) -> Self {
        let mut engine = Self {
            config,
            pending_config: None,
            mode: TimerMode::Pomodoro,
            phase: Phase::Work,
            anchor: None,
            paused_time_left: 0,
            paused_elapsed: 0,
            display_time: 0,
            phase_duration: 0,
            pomodoro_count: 0,
            long_break: false,
        };
        engine.clear();
        engine
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn mode(&self) -> TimerMode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn anchor(&self) -> Option<Anchor> {
        self.anchor
    }

    /// Seconds shown to the user: remaining in Pomodoro, elapsed in Free.
    pub fn display_time(&self) -> u64 {
        self.display_time
    }

    /// Elapsed seconds in Free mode, `0` in Pomodoro.
    pub fn elapsed_time(&self) -> u64 {
        match self.mode {
            TimerMode::Free => self.display_time,
            TimerMode::Pomodoro => 0,
        }
    }

    pub fn pomodoro_count(&self) -> u32 {
        self.pomodoro_count
    }

    pub fn phase_duration(&self) -> u64 {
        self.phase_duration
    }

    /// Whether the current break is a long one.
    pub fn is_long_break(&self) -> bool {
        self.phase == Phase::Break && self.long_break
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    pub fn pending_config(&self) -> Option<&TimerConfig> {
        self.pending_config.as_ref()
    }

    /// 0.0 .. 1.0 fraction of the current phase completed. `None` in Free mode.
    pub fn progress(&self) -> Option<f64> {
        match self.mode {
            TimerMode::Free => None,
            TimerMode::Pomodoro => {
                if self.phase_duration == 0 {
                    return Some(0.0);
                }
                Some(1.0 - self.display_time as f64 / self.phase_duration as f64)
            }
        }
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            mode: self.mode,
            phase: self.phase,
            is_running: self.is_running(),
            display_secs: self.display_time,
            elapsed_secs: self.elapsed_time(),
            phase_duration_secs: self.phase_duration,
            progress: self.progress(),
            pomodoro_count: self.pomodoro_count,
            long_break: self.is_long_break(),
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start or resume. Returns `None` if already running.
    pub fn start(&mut self, now_ms: i64) -> Option<Event> {
        if self.is_running() {
            return None;
        }
        self.anchor = Some(match self.mode {
            TimerMode::Pomodoro => Anchor::Countdown {
                target_end_ms: now_ms.saturating_add(secs_to_ms(self.paused_time_left)),
            },
            TimerMode::Free => Anchor::Stopwatch {
                start_ms: now_ms.saturating_sub(secs_to_ms(self.paused_elapsed)),
            },
        });
        tracing::debug!(mode = ?self.mode, phase = ?self.phase, "timer started");
        Some(Event::TimerStarted {
            mode: self.mode,
            phase: self.phase,
            display_secs: self.display_time,
            at_ms: now_ms,
        })
    }

    /// Snapshot remaining/elapsed time from the anchor and stop.
    /// Returns `None` if not running.
    pub fn pause(&mut self, now_ms: i64) -> Option<Event> {
        let anchor = self.anchor.take()?;
        match anchor {
            Anchor::Countdown { target_end_ms } => {
                let remaining = remaining_secs(target_end_ms, now_ms).min(self.phase_duration);
                self.paused_time_left = remaining;
                self.display_time = remaining;
            }
            Anchor::Stopwatch { start_ms } => {
                let elapsed = elapsed_secs(start_ms, now_ms);
                self.paused_elapsed = elapsed;
                self.display_time = elapsed;
            }
        }
        tracing::debug!(display = self.display_time, "timer paused");
        Some(Event::TimerPaused {
            mode: self.mode,
            display_secs: self.display_time,
            at_ms: now_ms,
        })
    }

    /// Stop and return to the current mode's initial state. Idempotent.
    pub fn reset(&mut self) -> Option<Event> {
        self.anchor = None;
        self.apply_pending();
        self.clear();
        Some(Event::TimerReset { mode: self.mode })
    }

    /// Restart the work phase with a new length without losing running state.
    ///
    /// `None` (or zero) falls back to the configured work duration.
    /// Pomodoro only; returns `None` in Free mode.
    pub fn restart(&mut self, new_work_duration: Option<u64>, now_ms: i64) -> Option<Event> {
        if self.mode != TimerMode::Pomodoro {
            return None;
        }
        let duration = new_work_duration
            .filter(|d| *d > 0)
            .unwrap_or(self.config.work_duration);
        self.phase = Phase::Work;
        self.long_break = false;
        self.set_countdown(duration);
        let running = self.is_running();
        if running {
            self.anchor = Some(Anchor::Countdown {
                target_end_ms: now_ms.saturating_add(secs_to_ms(duration)),
            });
        }
        Some(Event::TimerRestarted {
            duration_secs: duration,
            running,
        })
    }

    /// Stop, change mode and reset into the new mode's initial state.
    pub fn switch_mode(&mut self, mode: TimerMode) -> Option<Event> {
        self.anchor = None;
        self.mode = mode;
        self.apply_pending();
        self.clear();
        tracing::debug!(?mode, "timer mode switched");
        Some(Event::ModeSwitched { mode })
    }

    /// Jump from a break straight to a stopped, full-length work phase.
    /// Returns `None` outside `pomodoro.break`.
    pub fn skip_break(&mut self) -> Option<Event> {
        if self.mode != TimerMode::Pomodoro || self.phase != Phase::Break {
            return None;
        }
        self.anchor = None;
        self.apply_pending();
        self.phase = Phase::Work;
        self.long_break = false;
        self.set_countdown(self.config.work_duration);
        Some(Event::BreakSkipped)
    }

    /// Manual save of study time (Free mode). `None` when `duration_secs == 0`.
    pub fn complete_session(&self, duration_secs: u64, now_ms: i64) -> Option<Event> {
        (duration_secs > 0).then_some(Event::SessionCompleted {
            duration_secs,
            completed_at_ms: now_ms,
        })
    }

    /// Apply new phase lengths.
    ///
    /// While running the change is deferred until the next reset, mode
    /// switch or skipped break so an in-flight anchor is never rescaled.
    /// While stopped it applies at once and, in Pomodoro mode, refreshes the
    /// remaining time to the current phase's new full length.
    pub fn update_durations(&mut self, config: TimerConfig) {
        if self.is_running() {
            self.pending_config = Some(config);
            return;
        }
        self.pending_config = None;
        self.config = config;
        if self.mode == TimerMode::Pomodoro {
            let duration = match self.phase {
                Phase::Work => config.work_duration,
                Phase::Break if self.long_break => config.long_break_duration,
                Phase::Break => config.break_duration,
            };
            self.set_countdown(duration);
        }
    }

    /// Recompute the display from the anchor. Call periodically.
    ///
    /// Returns the events produced by a phase completion, in order:
    /// `SessionCompleted` (work phases only) then `PhaseCompleted`.
    /// A tick that arrives long after the phase ended completes it once and
    /// anchors the next phase at `now_ms`.
    pub fn tick(&mut self, now_ms: i64) -> Vec<Event> {
        let Some(anchor) = self.anchor else {
            return Vec::new();
        };
        match anchor {
            Anchor::Countdown { target_end_ms } => {
                let remaining = remaining_secs(target_end_ms, now_ms).min(self.phase_duration);
                self.display_time = remaining;
                if remaining > 0 {
                    return Vec::new();
                }
                match self.phase {
                    Phase::Work => self.complete_work(target_end_ms.min(now_ms), now_ms),
                    Phase::Break => self.complete_break(now_ms),
                }
            }
            Anchor::Stopwatch { start_ms } => {
                let elapsed = elapsed_secs(start_ms, now_ms);
                self.display_time = elapsed;
                self.paused_elapsed = elapsed;
                Vec::new()
            }
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn complete_work(&mut self, ended_at_ms: i64, now_ms: i64) -> Vec<Event> {
        let recorded = self.phase_duration;
        self.pomodoro_count += 1;
        self.long_break = self.config.is_long_break(self.pomodoro_count);
        let next = self.config.break_after(self.pomodoro_count);
        self.phase = Phase::Break;
        self.begin_countdown(next, now_ms);
        tracing::debug!(
            count = self.pomodoro_count,
            long_break = self.long_break,
            "work phase completed"
        );
        vec![
            Event::SessionCompleted {
                duration_secs: recorded,
                completed_at_ms: ended_at_ms,
            },
            Event::PhaseCompleted {
                phase: Phase::Work,
                next_duration_secs: next,
                long_break: self.long_break,
                at_ms: now_ms,
            },
        ]
    }

    fn complete_break(&mut self, now_ms: i64) -> Vec<Event> {
        let next = self.config.work_duration;
        self.phase = Phase::Work;
        self.long_break = false;
        self.begin_countdown(next, now_ms);
        tracing::debug!("break completed");
        vec![Event::PhaseCompleted {
            phase: Phase::Break,
            next_duration_secs: next,
            long_break: false,
            at_ms: now_ms,
        }]
    }

    fn begin_countdown(&mut self, duration: u64, now_ms: i64) {
        self.set_countdown(duration);
        self.anchor = Some(Anchor::Countdown {
            target_end_ms: now_ms.saturating_add(secs_to_ms(duration)),
        });
    }

    fn set_countdown(&mut self, duration: u64) {
        self.phase_duration = duration;
        self.paused_time_left = duration;
        self.display_time = duration;
    }

    /// Initial stopped state for the current mode. Leaves `mode` untouched.
    fn clear(&mut self) {
        self.phase = Phase::Work;
        self.long_break = false;
        self.pomodoro_count = 0;
        self.paused_elapsed = 0;
        match self.mode {
            TimerMode::Pomodoro => self.set_countdown(self.config.work_duration),
            TimerMode::Free => {
                self.phase_duration = 0;
                self.paused_time_left = 0;
                self.display_time = 0;
            }
        }
    }

    fn apply_pending(&mut self) {
        if let Some(config) = self.pending_config.take() {
            self.config = config;
        }
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(TimerConfig::default())
    }
}

fn secs_to_ms(secs: u64) -> i64 {
    i64::try_from(secs.saturating_mul(1000)).unwrap_or(i64::MAX)
}

/// `max(0, ceil((target - now) / 1000))`
fn remaining_secs(target_end_ms: i64, now_ms: i64) -> u64 {
    let diff = target_end_ms.saturating_sub(now_ms);
    if diff <= 0 {
        0
    } else {
        (diff as u64).div_ceil(1000)
    }
}

/// `max(0, floor((now - start) / 1000))`
fn elapsed_secs(start_ms: i64, now_ms: i64) -> u64 {
    let diff = now_ms.saturating_sub(start_ms);
    if diff <= 0 {
        0
    } else {
        diff as u64 / 1000
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    fn short_config() -> TimerConfig {
        TimerConfig {
            work_duration: 10,
            break_duration: 3,
            long_break_duration: 6,
            long_break_interval: 2,
        }
    }

    fn sessions(events: &[Event]) -> Vec<u64> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::SessionCompleted { duration_secs, .. } => Some(*duration_secs),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn initial_state_is_stopped_work() {
        let engine = TimerEngine::new(short_config());
        assert_eq!(engine.mode(), TimerMode::Pomodoro);
        assert_eq!(engine.phase(), Phase::Work);
        assert!(!engine.is_running());
        assert_eq!(engine.display_time(), 10);
        assert_eq!(engine.progress(), Some(0.0));
    }

    #[test]
    fn start_is_noop_when_running() {
        let mut engine = TimerEngine::new(short_config());
        assert!(engine.start(T0).is_some());
        assert!(engine.start(T0 + 5_000).is_none());
        assert_eq!(
            engine.anchor(),
            Some(Anchor::Countdown {
                target_end_ms: T0 + 10_000
            })
        );
    }

    #[test]
    fn pause_is_noop_when_stopped() {
        let mut engine = TimerEngine::new(short_config());
        assert!(engine.pause(T0).is_none());
        assert_eq!(engine.display_time(), 10);
    }

    #[test]
    fn tick_uses_ceiling_of_remaining() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        assert!(engine.tick(T0 + 100).is_empty());
        assert_eq!(engine.display_time(), 10);
        engine.tick(T0 + 1_000);
        assert_eq!(engine.display_time(), 9);
        engine.tick(T0 + 9_001);
        assert_eq!(engine.display_time(), 1);
    }

    #[test]
    fn missed_ticks_do_not_lose_time() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        // One tick after a long stall lands on the right value.
        engine.tick(T0 + 7_000);
        assert_eq!(engine.display_time(), 3);
    }

    #[test]
    fn pause_and_resume_preserve_remaining() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        engine.pause(T0 + 4_200);
        assert_eq!(engine.display_time(), 6);
        engine.start(T0 + 3_600_000);
        engine.tick(T0 + 3_600_000);
        assert_eq!(engine.display_time(), 6);
    }

    #[test]
    fn work_completion_records_session_and_enters_break() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        let events = engine.tick(T0 + 10_000);
        assert_eq!(sessions(&events), vec![10]);
        assert!(matches!(
            events.last(),
            Some(Event::PhaseCompleted {
                phase: Phase::Work,
                next_duration_secs: 3,
                long_break: false,
                ..
            })
        ));
        assert_eq!(engine.phase(), Phase::Break);
        assert_eq!(engine.pomodoro_count(), 1);
        assert!(engine.is_running());
        assert_eq!(engine.display_time(), 3);
    }

    #[test]
    fn break_completion_returns_to_work_without_session() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        engine.tick(T0 + 10_000);
        let events = engine.tick(T0 + 13_000);
        assert!(sessions(&events).is_empty());
        assert!(matches!(
            events.as_slice(),
            [Event::PhaseCompleted {
                phase: Phase::Break,
                next_duration_secs: 10,
                ..
            }]
        ));
        assert_eq!(engine.phase(), Phase::Work);
        assert!(engine.is_running());
    }

    #[test]
    fn long_break_after_interval() {
        let mut engine = TimerEngine::new(short_config());
        let mut now = T0;
        engine.start(now);
        now += 10_000;
        engine.tick(now);
        assert!(!engine.is_long_break());
        now += 3_000;
        engine.tick(now);
        now += 10_000;
        engine.tick(now);
        assert_eq!(engine.pomodoro_count(), 2);
        assert!(engine.is_long_break());
        assert_eq!(engine.phase_duration(), 6);
    }

    #[test]
    fn forward_jump_completes_phase_once() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        let events = engine.tick(T0 + 8 * 3_600_000);
        assert_eq!(sessions(&events), vec![10]);
        assert_eq!(engine.pomodoro_count(), 1);
        assert_eq!(engine.phase(), Phase::Break);
        assert_eq!(engine.display_time(), 3);
    }

    #[test]
    fn backward_jump_is_clamped() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        engine.tick(T0 - 60_000);
        assert_eq!(engine.display_time(), 10);

        engine.switch_mode(TimerMode::Free);
        engine.start(T0);
        engine.tick(T0 - 60_000);
        assert_eq!(engine.display_time(), 0);
    }

    #[test]
    fn free_mode_counts_up_and_resumes() {
        let mut engine = TimerEngine::new(short_config());
        engine.switch_mode(TimerMode::Free);
        assert_eq!(engine.progress(), None);
        engine.start(T0);
        assert!(engine.tick(T0 + 65_999).is_empty());
        assert_eq!(engine.elapsed_time(), 65);
        engine.pause(T0 + 70_500);
        assert_eq!(engine.display_time(), 70);
        engine.start(T0 + 100_000);
        engine.tick(T0 + 105_000);
        assert_eq!(engine.display_time(), 75);
        assert_eq!(engine.phase(), Phase::Work);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        engine.tick(T0 + 10_000);
        engine.reset();
        let once = engine.snapshot();
        engine.reset();
        assert_eq!(engine.snapshot(), once);
        assert_eq!(once.phase, Phase::Work);
        assert_eq!(once.display_secs, 10);
        assert_eq!(once.pomodoro_count, 0);
        assert!(!once.is_running);
    }

    #[test]
    fn restart_keeps_running_and_reanchors() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        engine.tick(T0 + 4_000);
        let event = engine.restart(Some(20), T0 + 5_000);
        assert_eq!(
            event,
            Some(Event::TimerRestarted {
                duration_secs: 20,
                running: true
            })
        );
        assert!(engine.is_running());
        engine.tick(T0 + 6_000);
        assert_eq!(engine.display_time(), 19);
    }

    #[test]
    fn restart_without_duration_uses_work_duration() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        engine.tick(T0 + 10_000);
        engine.pause(T0 + 11_000);
        engine.restart(None, T0 + 12_000);
        assert_eq!(engine.phase(), Phase::Work);
        assert_eq!(engine.display_time(), 10);
        assert!(!engine.is_running());
    }

    #[test]
    fn restart_is_ignored_in_free_mode() {
        let mut engine = TimerEngine::new(short_config());
        engine.switch_mode(TimerMode::Free);
        assert!(engine.restart(Some(30), T0).is_none());
        assert_eq!(engine.display_time(), 0);
    }

    #[test]
    fn skip_break_stops_at_full_work() {
        let mut engine = TimerEngine::new(short_config());
        assert!(engine.skip_break().is_none());
        engine.start(T0);
        engine.tick(T0 + 10_000);
        assert_eq!(engine.skip_break(), Some(Event::BreakSkipped));
        assert_eq!(engine.phase(), Phase::Work);
        assert!(!engine.is_running());
        assert_eq!(engine.display_time(), 10);
        assert_eq!(engine.pomodoro_count(), 1);
    }

    #[test]
    fn complete_session_requires_positive_duration() {
        let engine = TimerEngine::default();
        assert!(engine.complete_session(0, T0).is_none());
        assert_eq!(
            engine.complete_session(42, T0),
            Some(Event::SessionCompleted {
                duration_secs: 42,
                completed_at_ms: T0,
            })
        );
    }

    #[test]
    fn late_tick_dates_session_at_phase_end() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        let events = engine.tick(T0 + 3_600_000);
        assert_eq!(
            events[0],
            Event::SessionCompleted {
                duration_secs: 10,
                completed_at_ms: T0 + 10_000,
            }
        );
        // The break is still anchored at the tick that noticed the end.
        assert_eq!(engine.display_time(), 3);
    }

    #[test]
    fn duration_changes_wait_while_running() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        let longer = TimerConfig {
            work_duration: 50,
            ..short_config()
        };
        engine.update_durations(longer);
        assert_eq!(engine.config().work_duration, 10);
        engine.tick(T0 + 2_000);
        assert_eq!(engine.display_time(), 8);

        engine.reset();
        assert_eq!(engine.config().work_duration, 50);
        assert_eq!(engine.display_time(), 50);
        assert!(engine.pending_config().is_none());
    }

    #[test]
    fn duration_changes_apply_when_stopped() {
        let mut engine = TimerEngine::new(short_config());
        engine.update_durations(TimerConfig {
            work_duration: 40,
            ..short_config()
        });
        assert_eq!(engine.display_time(), 40);
        assert_eq!(engine.phase_duration(), 40);
    }

    #[test]
    fn serde_round_trip_preserves_anchor() {
        let mut engine = TimerEngine::new(short_config());
        engine.start(T0);
        let json = serde_json::to_string(&engine).unwrap();
        let mut restored: TimerEngine = serde_json::from_str(&json).unwrap();
        assert!(restored.is_running());
        restored.tick(T0 + 4_000);
        assert_eq!(restored.display_time(), 6);
    }
}
