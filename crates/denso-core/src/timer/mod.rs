mod clock;
mod config;
mod controller;
mod engine;

pub use clock::{now_ms, Clock, ManualClock, SystemClock};
pub use config::TimerConfig;
pub use controller::{TimerController, TimerListener, DEFAULT_TICK_INTERVAL};
pub use engine::{Anchor, Phase, TimerEngine, TimerMode, TimerSnapshot};
