use chrono::Local;
use clap::Subcommand;
use denso_core::stats::HEATMAP_WEEKS;
use denso_core::{activity_heatmap, format_duration, StatsSnapshot};
use serde::Serialize;

use super::{print_json, CmdResult, Store};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today/week totals, streak and per-subject time
    Show,
    /// Most recent sessions
    Recent {
        /// Number of sessions to list
        #[arg(long, default_value = "10")]
        limit: usize,
    },
    /// Daily study minutes over the last weeks, Monday first
    Heatmap {
        #[arg(long, default_value_t = HEATMAP_WEEKS)]
        weeks: usize,
    },
}

#[derive(Serialize)]
struct StatsView<'a> {
    #[serde(flatten)]
    stats: &'a StatsSnapshot,
    weekly_goal: u64,
    total_sessions: u64,
    today: String,
    week: String,
}

pub fn run(action: StatsAction) -> CmdResult {
    let store = Store::open()?;
    let log = store.session_log()?;

    match action {
        StatsAction::Show => {
            let stats = store.stats(&log)?;
            print_json(&StatsView {
                stats: &stats,
                weekly_goal: store.weekly_goal()?,
                total_sessions: store.db.session_count()?,
                today: format_duration(stats.today_total),
                week: format_duration(stats.week_total),
            })?;
        }
        StatsAction::Recent { limit } => {
            let sessions = log.snapshot();
            let recent: Vec<_> = sessions.iter().rev().take(limit).collect();
            print_json(&recent)?;
        }
        StatsAction::Heatmap { weeks } => {
            let sessions = log.snapshot();
            print_json(&activity_heatmap(&sessions, Local::now().date_naive(), weeks))?;
        }
    }
    Ok(())
}
