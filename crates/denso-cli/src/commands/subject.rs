use clap::Subcommand;
use denso_core::timer::now_ms;
use denso_core::SubjectUpdate;

use super::{print_json, CmdResult, Store};

#[derive(Subcommand)]
pub enum SubjectAction {
    /// List subjects (the current one is marked)
    List,
    /// Add a subject using the configured default durations
    Add {
        name: String,
        #[arg(long)]
        emoji: Option<String>,
    },
    /// Rename a subject
    Rename { id: String, name: String },
    /// Change a subject's Pomodoro lengths (minutes)
    Durations {
        id: String,
        #[arg(long)]
        work: Option<u64>,
        #[arg(long = "break")]
        short_break: Option<u64>,
        #[arg(long)]
        long_break: Option<u64>,
        /// Work phases before a long break
        #[arg(long)]
        interval: Option<u32>,
    },
    /// Delete a subject (the last one cannot be deleted)
    Delete { id: String },
    /// Make a subject current
    Use { id: String },
}

pub fn run(action: SubjectAction) -> CmdResult {
    let store = Store::open()?;
    let mut subjects = store.subjects()?;

    match action {
        SubjectAction::List => {
            for subject in subjects.list() {
                let marker = if subject.id == subjects.current_id() { "*" } else { " " };
                let emoji = subject.emoji.as_deref().unwrap_or("");
                println!(
                    "{marker} {}  {emoji} {}  ({}/{}/{} min, long every {})",
                    subject.id,
                    subject.name,
                    subject.work_duration / 60,
                    subject.break_duration / 60,
                    subject.long_break_duration / 60,
                    subject.long_break_interval,
                );
            }
            return Ok(());
        }
        SubjectAction::Add { name, emoji } => {
            let id = subjects.add(&name, &store.config.timer_config(), now_ms())?;
            if emoji.is_some() {
                subjects.update(
                    &id,
                    SubjectUpdate {
                        emoji: Some(emoji),
                        ..SubjectUpdate::default()
                    },
                )?;
            }
            println!("{id}");
        }
        SubjectAction::Rename { id, name } => {
            let update = SubjectUpdate {
                name: Some(name),
                ..SubjectUpdate::default()
            };
            print_json(subjects.update(&id, update)?)?;
        }
        SubjectAction::Durations {
            id,
            work,
            short_break,
            long_break,
            interval,
        } => {
            let minutes = |m: Option<u64>| m.map(|m| m.saturating_mul(60));
            let update = SubjectUpdate {
                work_duration: minutes(work),
                break_duration: minutes(short_break),
                long_break_duration: minutes(long_break),
                long_break_interval: interval,
                ..SubjectUpdate::default()
            };
            print_json(subjects.update(&id, update)?)?;
        }
        SubjectAction::Delete { id } => {
            let removed = subjects.delete(&id)?;
            println!("deleted {} ({})", removed.id, removed.name);
        }
        SubjectAction::Use { id } => {
            subjects.set_current(&id)?;
            println!("current subject: {}", subjects.current().name);
        }
    }

    store.save_subjects(&subjects)?;
    Ok(())
}
