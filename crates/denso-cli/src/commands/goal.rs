use clap::Subcommand;
use denso_core::storage::keys;
use denso_core::{format_duration, KeyValueStore};

use super::{CmdResult, Store};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Print the weekly study goal
    Show,
    /// Set the weekly study goal
    Set {
        /// Hours per week
        hours: f64,
    },
}

pub fn run(action: GoalAction) -> CmdResult {
    let store = Store::open()?;

    match action {
        GoalAction::Show => {
            let goal = store.weekly_goal()?;
            println!("{} ({goal} s)", format_duration(goal));
        }
        GoalAction::Set { hours } => {
            if !hours.is_finite() || hours < 0.0 {
                return Err(format!("invalid goal: {hours}").into());
            }
            let secs = (hours * 3600.0).round() as u64;
            store.db.save(keys::WEEKLY_GOAL, &secs)?;
            println!("weekly goal set to {}", format_duration(secs));
        }
    }
    Ok(())
}
