use clap::Args;
use serde::Serialize;

use denso_core::achievements::AchievementStatus;

use super::{print_json, CmdResult, Store};

#[derive(Args)]
pub struct AchievementsArgs {
    /// Only list unlocked achievements
    #[arg(long)]
    unlocked: bool,
}

#[derive(Serialize)]
struct AchievementsView {
    unlocked: usize,
    total: usize,
    achievements: Vec<AchievementStatus>,
}

pub fn run(args: AchievementsArgs) -> CmdResult {
    let store = Store::open()?;
    let log = store.session_log()?;
    for achievement in store.check_achievements(&log)? {
        eprintln!("achievement unlocked: {} {}", achievement.icon, achievement.title);
    }

    let tracker = store.tracker()?;
    let mut achievements = tracker.statuses();
    if args.unlocked {
        achievements.retain(|a| a.unlocked);
    }
    print_json(&AchievementsView {
        unlocked: tracker.unlocked_count(),
        total: tracker.total_count(),
        achievements,
    })
}
