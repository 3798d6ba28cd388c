use chrono::{Datelike, Local, NaiveDate};
use clap::Subcommand;
use denso_core::stats::parse_key;
use denso_core::storage::keys;
use denso_core::timer::now_ms;
use denso_core::{EventKind, KeyValueStore, NewEvent};

use super::{print_json, CmdResult, Store};

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Add an event
    Add {
        title: String,
        /// Day of the event, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// study-block, exam or personal
        #[arg(long, default_value = "study-block")]
        kind: EventKind,
        /// Start time, HH:MM
        #[arg(long)]
        time: Option<String>,
        /// Length in minutes
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        subject: Option<String>,
    },
    /// Events on one day (default today)
    List {
        #[arg(long)]
        date: Option<String>,
    },
    /// Events in a month (default the current one)
    Month {
        #[arg(long)]
        year: Option<i32>,
        /// 1-12
        #[arg(long)]
        month: Option<u32>,
    },
    /// Next open events
    Upcoming,
    /// Exams from today on
    Exams,
    /// Mark an event done or not done
    Toggle { id: String },
    /// Delete an event
    Delete { id: String },
}

fn day(date: Option<String>) -> Result<NaiveDate, String> {
    match date {
        Some(date) => parse_key(&date).ok_or_else(|| format!("invalid date: {date}")),
        None => Ok(Local::now().date_naive()),
    }
}

pub fn run(action: CalendarAction) -> CmdResult {
    let store = Store::open()?;
    let mut calendar = store.calendar()?;
    let today = Local::now().date_naive();

    match action {
        CalendarAction::Add {
            title,
            date,
            kind,
            time,
            duration,
            subject,
        } => {
            let id = calendar.add(
                NewEvent {
                    kind,
                    title,
                    date,
                    time,
                    duration,
                    subject_id: subject,
                },
                now_ms(),
            )?;
            println!("{id}");
        }
        CalendarAction::List { date } => return print_json(&calendar.for_date(day(date)?)),
        CalendarAction::Month { year, month } => {
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            if !(1..=12).contains(&month) {
                return Err(format!("invalid month: {month}").into());
            }
            return print_json(&calendar.for_month(year, month));
        }
        CalendarAction::Upcoming => return print_json(&calendar.upcoming(today)),
        CalendarAction::Exams => return print_json(&calendar.upcoming_exams(today)),
        CalendarAction::Toggle { id } => {
            let done = calendar.toggle_complete(&id)?;
            println!("{}", if done { "done" } else { "open" });
        }
        CalendarAction::Delete { id } => {
            let removed = calendar.delete(&id)?;
            println!("deleted {}", removed.title);
        }
    }

    store.db.save(keys::EVENTS, &calendar)?;
    Ok(())
}
