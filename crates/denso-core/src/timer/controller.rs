//! Tick driver for [`TimerEngine`].
//!
//! The controller owns the engine behind a single async mutex. Control
//! commands and ticks both hold that lock for their whole duration, so a
//! tick never interleaves with `start`/`pause`/`reset`/`switch_mode`.
//!
//! Ticks come from a spawned tokio task. Stopping the timer aborts that task
//! while the engine lock is held, and every tick re-checks `is_running`
//! under the lock, so nothing touches the engine after a logical stop.

use std::sync::{Arc, Mutex as StdMutex};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use super::clock::Clock;
use super::config::TimerConfig;
use super::engine::{Phase, TimerEngine, TimerMode, TimerSnapshot};
use crate::events::Event;

/// Default tick period. Only affects display smoothness, not accuracy.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Receives the side effects of timer progress.
///
/// Called with the engine lock held; implementations must not call back
/// into the controller.
pub trait TimerListener: Send + Sync {
    /// A unit of study time finished at `completed_at_ms` and should be
    /// recorded.
    fn on_session_complete(&self, _duration_secs: u64, _completed_at_ms: i64) {}

    /// A countdown phase ended (sound, notification, vibration).
    fn on_phase_complete(&self, _phase: Phase) {}
}

impl TimerListener for () {}

struct Shared {
    engine: Mutex<TimerEngine>,
    clock: Arc<dyn Clock>,
    listener: Arc<dyn TimerListener>,
}

pub struct TimerController {
    shared: Arc<Shared>,
    ticker: StdMutex<Option<JoinHandle<()>>>,
    tick_interval: Duration,
}

impl TimerController {
    pub fn new(
        engine: TimerEngine,
        clock: Arc<dyn Clock>,
        listener: Arc<dyn TimerListener>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(engine),
                clock,
                listener,
            }),
            ticker: StdMutex::new(None),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub async fn snapshot(&self) -> TimerSnapshot {
        self.shared.engine.lock().await.snapshot()
    }

    /// Copy of the engine, e.g. for persistence.
    pub async fn engine(&self) -> TimerEngine {
        self.shared.engine.lock().await.clone()
    }

    /// Whether a tick task is currently scheduled.
    pub fn is_ticking(&self) -> bool {
        self.ticker_slot()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub async fn start(&self) -> Option<Event> {
        let mut engine = self.shared.engine.lock().await;
        let event = engine.start(self.shared.clock.now_ms());
        if event.is_some() {
            self.spawn_ticker();
        }
        event
    }

    /// Schedule ticks for an engine that was already running when handed
    /// to the controller. Returns `false` if it is stopped or already ticking.
    pub async fn resume_ticking(&self) -> bool {
        let engine = self.shared.engine.lock().await;
        if !engine.is_running() || self.is_ticking() {
            return false;
        }
        self.spawn_ticker();
        true
    }

    pub async fn pause(&self) -> Option<Event> {
        let mut engine = self.shared.engine.lock().await;
        self.cancel_ticker();
        engine.pause(self.shared.clock.now_ms())
    }

    pub async fn reset(&self) -> Option<Event> {
        let mut engine = self.shared.engine.lock().await;
        self.cancel_ticker();
        engine.reset()
    }

    pub async fn restart(&self, new_work_duration: Option<u64>) -> Option<Event> {
        let mut engine = self.shared.engine.lock().await;
        engine.restart(new_work_duration, self.shared.clock.now_ms())
    }

    pub async fn switch_mode(&self, mode: TimerMode) -> Option<Event> {
        let mut engine = self.shared.engine.lock().await;
        self.cancel_ticker();
        engine.switch_mode(mode)
    }

    pub async fn skip_break(&self) -> Option<Event> {
        let mut engine = self.shared.engine.lock().await;
        let event = engine.skip_break();
        if event.is_some() {
            self.cancel_ticker();
        }
        event
    }

    /// Save free-mode time through the listener. No-op for zero durations.
    pub async fn complete_session(&self, duration_secs: u64) -> Option<Event> {
        let engine = self.shared.engine.lock().await;
        let event = engine.complete_session(duration_secs, self.shared.clock.now_ms())?;
        dispatch(self.shared.listener.as_ref(), std::slice::from_ref(&event));
        Some(event)
    }

    pub async fn update_durations(&self, config: TimerConfig) {
        self.shared.engine.lock().await.update_durations(config);
    }

    /// Run one tick immediately, outside the periodic schedule.
    pub async fn tick_now(&self) -> Vec<Event> {
        let mut engine = self.shared.engine.lock().await;
        tick_locked(&self.shared, &mut engine)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn ticker_slot(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.ticker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Must be called with the engine lock held.
    fn spawn_ticker(&self) {
        let shared = Arc::clone(&self.shared);
        let period = self.tick_interval;
        let handle = tokio::spawn(async move {
            let mut interval = time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;
                let mut engine = shared.engine.lock().await;
                if !engine.is_running() {
                    break;
                }
                tick_locked(&shared, &mut engine);
            }
        });
        if let Some(previous) = self.ticker_slot().replace(handle) {
            previous.abort();
        }
    }

    /// Must be called with the engine lock held.
    fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker_slot().take() {
            handle.abort();
        }
    }
}

impl Drop for TimerController {
    fn drop(&mut self) {
        self.cancel_ticker();
    }
}

fn tick_locked(shared: &Shared, engine: &mut TimerEngine) -> Vec<Event> {
    let events = engine.tick(shared.clock.now_ms());
    dispatch(shared.listener.as_ref(), &events);
    events
}

fn dispatch(listener: &dyn TimerListener, events: &[Event]) {
    for event in events {
        match event {
            Event::SessionCompleted {
                duration_secs,
                completed_at_ms,
            } => listener.on_session_complete(*duration_secs, *completed_at_ms),
            Event::PhaseCompleted { phase, .. } => listener.on_phase_complete(*phase),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualClock;

    const T0: i64 = 1_700_000_000_000;

    #[derive(Default)]
    struct Recorder {
        sessions: StdMutex<Vec<u64>>,
        phases: StdMutex<Vec<Phase>>,
    }

    impl Recorder {
        fn sessions(&self) -> Vec<u64> {
            self.sessions.lock().unwrap().clone()
        }

        fn phases(&self) -> Vec<Phase> {
            self.phases.lock().unwrap().clone()
        }
    }

    impl TimerListener for Recorder {
        fn on_session_complete(&self, duration_secs: u64, _completed_at_ms: i64) {
            self.sessions.lock().unwrap().push(duration_secs);
        }

        fn on_phase_complete(&self, phase: Phase) {
            self.phases.lock().unwrap().push(phase);
        }
    }

    fn one_second_work() -> TimerConfig {
        TimerConfig {
            work_duration: 1,
            break_duration: 300,
            long_break_duration: 900,
            long_break_interval: 4,
        }
    }

    fn controller(clock: &Arc<ManualClock>, recorder: &Arc<Recorder>) -> TimerController {
        TimerController::new(
            TimerEngine::new(one_second_work()),
            clock.clone(),
            recorder.clone(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn ticker_completes_work_phase_once() {
        let clock = Arc::new(ManualClock::new(T0));
        let recorder = Arc::new(Recorder::default());
        let ctl = controller(&clock, &recorder);

        assert!(ctl.start().await.is_some());
        assert!(ctl.is_ticking());
        clock.advance(1_500);
        time::sleep(Duration::from_millis(250)).await;

        assert_eq!(recorder.sessions(), vec![1]);
        assert_eq!(recorder.phases(), vec![Phase::Work]);
        let snap = ctl.snapshot().await;
        assert_eq!(snap.phase, Phase::Break);
        assert_eq!(snap.pomodoro_count, 1);

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(recorder.sessions(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_cancels_ticks_synchronously() {
        let clock = Arc::new(ManualClock::new(T0));
        let recorder = Arc::new(Recorder::default());
        let ctl = controller(&clock, &recorder);

        ctl.start().await;
        ctl.pause().await;
        assert!(!ctl.is_ticking());

        clock.advance(10 * 60_000);
        time::sleep(Duration::from_secs(2)).await;

        let snap = ctl.snapshot().await;
        assert!(!snap.is_running);
        assert_eq!(snap.display_secs, 1);
        assert!(recorder.sessions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn switch_mode_stops_ticker() {
        let clock = Arc::new(ManualClock::new(T0));
        let ctl = controller(&clock, &Arc::new(Recorder::default()));

        ctl.start().await;
        ctl.switch_mode(TimerMode::Free).await;
        assert!(!ctl.is_ticking());
        clock.advance(5_000);
        time::sleep(Duration::from_secs(1)).await;
        let snap = ctl.snapshot().await;
        assert_eq!(snap.mode, TimerMode::Free);
        assert_eq!(snap.display_secs, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn free_mode_ticks_elapsed_and_saves_manually() {
        let clock = Arc::new(ManualClock::new(T0));
        let recorder = Arc::new(Recorder::default());
        let ctl = controller(&clock, &recorder);

        ctl.switch_mode(TimerMode::Free).await;
        ctl.start().await;
        clock.advance(42_300);
        time::sleep(Duration::from_millis(150)).await;
        let elapsed = ctl.snapshot().await.elapsed_secs;
        assert_eq!(elapsed, 42);
        assert!(recorder.sessions().is_empty());

        ctl.pause().await;
        assert!(ctl.complete_session(0).await.is_none());
        ctl.complete_session(elapsed).await;
        assert_eq!(recorder.sessions(), vec![42]);
    }

    #[tokio::test(start_paused = true)]
    async fn double_start_keeps_single_ticker() {
        let clock = Arc::new(ManualClock::new(T0));
        let recorder = Arc::new(Recorder::default());
        let ctl = controller(&clock, &recorder);

        assert!(ctl.start().await.is_some());
        assert!(ctl.start().await.is_none());
        clock.advance(1_000);
        time::sleep(Duration::from_millis(300)).await;
        assert_eq!(recorder.sessions(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn resume_ticking_drives_a_running_engine() {
        let clock = Arc::new(ManualClock::new(T0));
        let recorder = Arc::new(Recorder::default());
        let mut engine = TimerEngine::new(one_second_work());
        engine.start(T0);
        let ctl = TimerController::new(engine, clock.clone(), recorder.clone());

        assert!(!ctl.is_ticking());
        assert!(ctl.resume_ticking().await);
        assert!(!ctl.resume_ticking().await);

        clock.advance(1_000);
        time::sleep(Duration::from_millis(250)).await;
        assert_eq!(recorder.sessions(), vec![1]);
    }

    #[tokio::test]
    async fn tick_now_is_noop_when_stopped() {
        let clock = Arc::new(ManualClock::new(T0));
        let ctl = controller(&clock, &Arc::new(Recorder::default()));
        assert!(ctl.tick_now().await.is_empty());
        assert!(!ctl.is_ticking());
    }
}
