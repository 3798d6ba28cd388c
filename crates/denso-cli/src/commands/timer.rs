use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use clap::{Subcommand, ValueEnum};
use denso_core::timer::now_ms;
use denso_core::{
    format_time, Event, Phase, SubjectStore, SystemClock, TimerController, TimerEngine,
    TimerListener, TimerMode,
};
use tokio::sync::mpsc;

use super::{print_json, CmdResult, Store};

#[derive(Clone, Copy, ValueEnum)]
pub enum ModeArg {
    Pomodoro,
    Free,
}

impl From<ModeArg> for TimerMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Pomodoro => TimerMode::Pomodoro,
            ModeArg::Free => TimerMode::Free,
        }
    }
}

#[derive(Subcommand)]
pub enum TimerAction {
    /// Print current timer state as JSON (records any finished work)
    Status,
    /// Start or resume the timer
    Start,
    /// Pause the timer
    Pause,
    /// Stop and return to the start of the current mode
    Reset,
    /// Restart the work phase, optionally with a new length
    Restart {
        /// Work length in minutes
        #[arg(long)]
        minutes: Option<u64>,
    },
    /// Switch between pomodoro and free (stopwatch) mode
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Skip the current break
    SkipBreak,
    /// Save the free-mode stopwatch as a session and reset it
    Save,
    /// Run the timer in the foreground with a live display
    Watch {
        /// Return after this many completed phases
        #[arg(long, default_value = "1")]
        phases: u32,
    },
}

pub fn run(action: TimerAction) -> CmdResult {
    let store = Store::open()?;
    let subjects = store.subjects()?;
    let mut engine = store.engine(&subjects)?;
    let now = now_ms();

    // Catch up on anything that finished since the last invocation.
    let caught_up = engine.tick(now);
    handle_events(&store, &subjects, &caught_up)?;

    match action {
        TimerAction::Status => {
            print_json(&engine.snapshot())?;
            for event in &caught_up {
                print_json(event)?;
            }
        }
        TimerAction::Start => print_outcome(engine.start(now), &engine)?,
        TimerAction::Pause => print_outcome(engine.pause(now), &engine)?,
        TimerAction::Reset => print_outcome(engine.reset(), &engine)?,
        TimerAction::Restart { minutes } => {
            let outcome = engine.restart(minutes.map(|m| m.saturating_mul(60)), now);
            if outcome.is_none() {
                return Err("restart is only available in pomodoro mode".into());
            }
            print_outcome(outcome, &engine)?;
        }
        TimerAction::Mode { mode } => print_outcome(engine.switch_mode(mode.into()), &engine)?,
        TimerAction::SkipBreak => print_outcome(engine.skip_break(), &engine)?,
        TimerAction::Save => {
            if engine.mode() != TimerMode::Free {
                return Err("save is only available in free mode".into());
            }
            engine.pause(now);
            let elapsed = engine.elapsed_time();
            match engine.complete_session(elapsed, now) {
                Some(event) => {
                    handle_events(&store, &subjects, std::slice::from_ref(&event))?;
                    engine.reset();
                    print_json(&event)?;
                }
                None => return Err("nothing to save".into()),
            }
        }
        TimerAction::Watch { phases } => {
            store.save_engine(&engine)?;
            let rt = tokio::runtime::Runtime::new()?;
            engine = rt.block_on(watch(&store, &subjects, engine, phases))?;
        }
    }

    store.save_engine(&engine)?;
    Ok(())
}

fn print_outcome(event: Option<Event>, engine: &TimerEngine) -> CmdResult {
    match event {
        Some(event) => print_json(&event),
        None => print_json(&engine.snapshot()),
    }
}

/// Record completed work and announce phase changes.
fn handle_events(store: &Store, subjects: &SubjectStore, events: &[Event]) -> CmdResult {
    for event in events {
        match event {
            Event::SessionCompleted {
                duration_secs,
                completed_at_ms,
            } => {
                store.record_session(*duration_secs, *completed_at_ms, subjects)?;
            }
            Event::PhaseCompleted { phase, .. } => announce(*phase, store.config.sound.enabled),
            _ => {}
        }
    }
    Ok(())
}

fn announce(phase: Phase, bell: bool) {
    let message = match phase {
        Phase::Work => "work phase complete, time for a break",
        Phase::Break => "break over, back to work",
    };
    if bell {
        eprint!("\x07");
    }
    eprintln!("{message}");
}

// ── Watch ────────────────────────────────────────────────────────────

enum Notice {
    Session {
        duration_secs: u64,
        completed_at_ms: i64,
    },
    Phase(Phase),
}

/// Forwards timer callbacks to the watch loop, which owns the database.
struct ChannelListener {
    tx: mpsc::UnboundedSender<Notice>,
}

impl TimerListener for ChannelListener {
    fn on_session_complete(&self, duration_secs: u64, completed_at_ms: i64) {
        let _ = self.tx.send(Notice::Session {
            duration_secs,
            completed_at_ms,
        });
    }

    fn on_phase_complete(&self, phase: Phase) {
        let _ = self.tx.send(Notice::Phase(phase));
    }
}

async fn watch(
    store: &Store,
    subjects: &SubjectStore,
    engine: TimerEngine,
    phases: u32,
) -> Result<TimerEngine, Box<dyn std::error::Error>> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let controller = TimerController::new(
        engine,
        Arc::new(SystemClock),
        Arc::new(ChannelListener { tx }),
    )
    .with_tick_interval(store.config.tick_interval());

    if controller.start().await.is_none() {
        controller.resume_ticking().await;
    }
    store.save_engine(&controller.engine().await)?;

    let mut refresh = tokio::time::interval(Duration::from_secs(1));
    let mut completed = 0;
    loop {
        tokio::select! {
            Some(notice) = rx.recv() => {
                match notice {
                    Notice::Session {
                        duration_secs,
                        completed_at_ms,
                    } => {
                        store.record_session(duration_secs, completed_at_ms, subjects)?;
                    }
                    Notice::Phase(phase) => {
                        completed += 1;
                        eprintln!();
                        announce(phase, store.config.sound.enabled);
                    }
                }
                store.save_engine(&controller.engine().await)?;
                if completed >= phases {
                    break;
                }
            }
            _ = refresh.tick() => {
                let snap = controller.snapshot().await;
                let label = match (snap.mode, snap.phase) {
                    (TimerMode::Free, _) => "free",
                    (TimerMode::Pomodoro, Phase::Work) => "work",
                    (TimerMode::Pomodoro, Phase::Break) if snap.long_break => "long break",
                    (TimerMode::Pomodoro, Phase::Break) => "break",
                };
                eprint!(
                    "\r{label:>10}  {}  #{}   ",
                    format_time(snap.display_secs),
                    snap.pomodoro_count
                );
                std::io::stderr().flush()?;
                if !snap.is_running {
                    break;
                }
            }
        }
    }
    eprintln!();
    Ok(controller.engine().await)
}
