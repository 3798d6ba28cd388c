use clap::Subcommand;
use denso_core::timer::now_ms;

use super::{print_json, CmdResult, Store};

#[derive(Subcommand)]
pub enum TodoAction {
    /// List to-dos of a subject
    List {
        /// Subject id (defaults to the current subject)
        #[arg(long)]
        subject: Option<String>,
    },
    /// Add a to-do
    Add {
        text: String,
        #[arg(long)]
        subject: Option<String>,
    },
    /// Mark a to-do done or not done
    Toggle {
        id: String,
        #[arg(long)]
        subject: Option<String>,
    },
    /// Delete a to-do
    Delete {
        id: String,
        #[arg(long)]
        subject: Option<String>,
    },
}

pub fn run(action: TodoAction) -> CmdResult {
    let store = Store::open()?;
    let mut subjects = store.subjects()?;
    let current = subjects.current_id().to_string();
    let pick = |subject: Option<String>| subject.unwrap_or_else(|| current.clone());

    match action {
        TodoAction::List { subject } => {
            let id = pick(subject);
            let subject = subjects
                .get(&id)
                .ok_or_else(|| format!("subject not found: {id}"))?;
            return print_json(&subject.todos);
        }
        TodoAction::Add { text, subject } => {
            let subject = pick(subject);
            let id = subjects.add_todo(&subject, &text, now_ms())?;
            println!("{id}");
        }
        TodoAction::Toggle { id, subject } => {
            let subject = pick(subject);
            let done = subjects.toggle_todo(&subject, &id)?;
            println!("{}", if done { "done" } else { "open" });
        }
        TodoAction::Delete { id, subject } => {
            let subject = pick(subject);
            let removed = subjects.delete_todo(&subject, &id)?;
            println!("deleted {}", removed.text);
        }
    }

    store.save_subjects(&subjects)?;
    Ok(())
}
